/// Router Module Index
///
/// Routes are grouped by access tier. Each module only declares paths and handlers;
/// the gates are attached in `create_router` and in the tier modules below, so a
/// route cannot end up unprotected by being added to the wrong file.

/// Routes accessible without a token.
pub mod public;

/// Routes requiring any authenticated identity. Submission routes additionally carry
/// the submitter role gate.
pub mod authenticated;

/// Routes restricted to supervisors and admins (project review).
pub mod review;

/// Routes restricted to admins.
pub mod admin;
