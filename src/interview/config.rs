use serde::{Deserialize, Serialize};

use crate::answers::{ApplicantId, InterviewId};

/// Configuration for one interview run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// The interview whose questions are being answered
    pub interview: InterviewId,

    /// The applicant giving the answers
    pub applicant: ApplicantId,
}
