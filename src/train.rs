mod exponential_smoother;
mod loss;
mod trainer;

pub use exponential_smoother::ExponentialSmootherWithRunUpPeriod;
pub use loss::{accuracy, l2_penalty, labels_tensor, logistic_loss};
pub use trainer::{Evaluation, StepReport, TrainConfig, Trainer};
