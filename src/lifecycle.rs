use crate::{error::AppError, models::ProjectStatus};

/// Project review lifecycle.
///
/// ```text
/// Pending ──► Approved
///    │
///    └──────► Rejected
/// ```
///
/// Approved and Rejected are terminal. New submissions always start in `Pending`.
impl ProjectStatus {
    pub const INITIAL: ProjectStatus = ProjectStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::Approved => "Approved",
            ProjectStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            ProjectStatus::Pending => false,
            ProjectStatus::Approved | ProjectStatus::Rejected => true,
        }
    }

    pub fn can_transition_to(&self, target: ProjectStatus) -> bool {
        matches!(
            (self, target),
            (ProjectStatus::Pending, ProjectStatus::Approved)
                | (ProjectStatus::Pending, ProjectStatus::Rejected)
        )
    }

    /// Parses the body of a status update. Only the exact strings "Approved" and
    /// "Rejected" are review decisions; "Pending", lowercase variants and anything else
    /// are rejected.
    pub fn parse_decision(raw: Option<&str>) -> Result<ProjectStatus, AppError> {
        match raw {
            Some("Approved") => Ok(ProjectStatus::Approved),
            Some("Rejected") => Ok(ProjectStatus::Rejected),
            _ => Err(AppError::InvalidRequest(
                "Invalid status provided. Must be Approved or Rejected.".to_string(),
            )),
        }
    }

    /// Parses a status taken from a URL path segment, normalizing case
    /// (`pending`, `PENDING` and `Pending` are all accepted).
    pub fn from_path_segment(segment: &str) -> Result<ProjectStatus, AppError> {
        let mut chars = segment.chars();
        let normalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
            None => String::new(),
        };

        match normalized.as_str() {
            "Pending" => Ok(ProjectStatus::Pending),
            "Approved" => Ok(ProjectStatus::Approved),
            "Rejected" => Ok(ProjectStatus::Rejected),
            _ => Err(AppError::InvalidRequest("Invalid status requested.".to_string())),
        }
    }

    /// Validates a review decision against the current state and returns the new state.
    pub fn transition(self, target: ProjectStatus) -> Result<ProjectStatus, AppError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(AppError::InvalidRequest(format!(
                "Project is already {} and cannot be moved to {}.",
                self, target
            )))
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
