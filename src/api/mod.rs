// =============================================================================
// HTTP boundary
// =============================================================================

pub mod rest;
