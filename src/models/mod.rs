pub mod item;
pub mod loaders;
pub mod mode;
pub mod reference;
pub mod result;
pub mod settings;

pub use item::InputItem;
pub use loaders::{load_images_from_folder, load_manifest, DetectionManifest};
pub use mode::{AnalysisMode, ModeKind, ScoreDirection, NO_MATCH_DISTANCE};
pub use reference::{FeatureVector, ReferenceSet};
pub use result::{AnalysisResult, Annotation, Counters, FinalState, Progress, RunState};
pub use settings::AnalysisSettings;
