mod error;
mod observer;
mod pass_finder;
pub mod propagation;
mod types;

pub use error::PredictError;
pub use observer::Observer;
pub use pass_finder::{detect_passes, WindowEdgePolicy};
pub use propagation::{look_angles_at, FrameConverter, Propagator, Sgp4Propagator, Wgs84Converter};
pub use types::{LookAngles, Pass, PendingPass};
