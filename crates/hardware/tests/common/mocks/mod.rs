

pub use device::{Access, RecordingDevice};
pub use sink::SharedBuf;
