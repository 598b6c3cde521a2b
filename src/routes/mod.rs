/// Router Module Index
///
/// Every route here sits behind the access gate, which is layered over the
/// whole router in `create_router`. The split only says who ends up serving
/// the request once the gate has let it through.

/// Routes answered by the gate process itself and excluded from gating.
pub mod public;

/// Local routes that need the verified session attached by the gate.
pub mod authenticated;

/// Routes relayed to the API host; the page fallback lives in `create_router`.
pub mod proxy;
