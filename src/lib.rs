pub mod api;
pub mod collect;
pub mod dynamics;
pub mod ensemble;
pub mod error;
pub mod events;
pub mod instruments;
pub mod measures;
pub mod options;
pub mod score;

pub use api::{convert, Timeline};
pub use ensemble::{detect_ensembles, EnsembleSuggestion};
pub use error::*;
pub use events::{Connection, NoteEvent, RehearsalMark};
pub use instruments::{classify, Ensemble, Family};
pub use measures::{MeasureOffsetMap, MeasureTick};
pub use options::{ConversionOptions, RawOptions};
pub use score::Score;
