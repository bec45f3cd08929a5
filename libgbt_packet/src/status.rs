/// Progress of a job, sent after each case finishes
#[derive(Debug, Clone, Default)]
pub struct CaseStatus {
    pub progress: f32,
    pub case_index: usize,
}

impl CaseStatus {
    pub fn new(progress: f32, case_index: usize) -> Self {
        Self {
            progress,
            case_index,
        }
    }
}
