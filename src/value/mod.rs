mod array_value;
mod codec;
pub mod extract;
mod map_value;
mod native;
mod value;

pub use array_value::ArrayValue;
pub use codec::{decode_fields, decode_value, encode_fields, encode_value};
pub use map_value::MapValue;
pub use native::NativeValue;
pub use value::{FirestoreValue, ValueKind};
