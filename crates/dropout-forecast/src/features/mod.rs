mod domain;
mod engineer;
mod imputation;
mod vector;

pub use domain::{HistoricalTable, Record, FUNNEL_CEILING, FUNNEL_EPSILON};
pub use engineer::{FeatureEngineer, LagPolicy, PreparedDataset};
pub use imputation::{median, CLASS_SIZE_OUTLIER, CLASS_SIZE_RESCALE};
pub use vector::{FeatureName, FeatureVector, FEATURE_COUNT};
