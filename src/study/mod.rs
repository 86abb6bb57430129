// Study module - the study/pause cycle timer widget

pub mod cycle;

pub use cycle::{StudyEvent, StudyPauseCycle, StudyPhase, StudySession, StudySnapshot};
