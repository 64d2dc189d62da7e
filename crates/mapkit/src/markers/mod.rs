mod record;
mod store;

pub use record::{parse_hex_color, MarkerId, MarkerPatch, MarkerRecord, DEFAULT_MARKER_COLOR};
pub use store::{
    default_marker_name, parse_coordinate, parse_coordinate_pair, Axis, MarkerInputError,
    MarkerStore,
};
