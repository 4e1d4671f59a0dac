//! Schemas shipped with the crate. The files live at the workspace root
//! under `schemas/` so operators can copy and extend them.

pub(crate) const VERSION: &str = "v0.1";

/// `(file stem, schema text)` for every builtin v0.1 schema.
pub(crate) const V0_1: &[(&str, &str)] = &[
    (
        "entity.organization",
        include_str!("../../../../schemas/v0.1/entity.organization.json"),
    ),
    (
        "entity.service",
        include_str!("../../../../schemas/v0.1/entity.service.json"),
    ),
    (
        "entity.location",
        include_str!("../../../../schemas/v0.1/entity.location.json"),
    ),
    (
        "entity.person",
        include_str!("../../../../schemas/v0.1/entity.person.json"),
    ),
    (
        "edge.schema",
        include_str!("../../../../schemas/v0.1/edge.schema.json"),
    ),
    (
        "source.schema",
        include_str!("../../../../schemas/v0.1/source.schema.json"),
    ),
    (
        "pkg.manifest",
        include_str!("../../../../schemas/v0.1/pkg.manifest.json"),
    ),
];
