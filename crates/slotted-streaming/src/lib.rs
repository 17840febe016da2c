//! Out-of-order HTML streaming.
//!
//! A page is a [`Composite`]: literal text interleaved with interpolated
//! values. Rendering produces a [`ChunkStream`](slotted_core::ChunkStream):
//! - `render_in_order` - values are awaited in declaration order
//! - `render_out_of_order` - a skeleton with named slots goes out first,
//!   then one fill-in per value as each one settles
//! - `into_byte_stream` / `into_response` - framing for a transport
//! - `BodyWriter` - drives a body into any byte sink

mod body;
mod flush;
mod in_order;
mod interleave;
mod markup;
mod node;
mod out_of_order;
mod sequencer;
mod sink;

pub use body::*;
pub use flush::*;
pub use in_order::*;
pub use interleave::*;
pub use markup::*;
pub use node::*;
pub use out_of_order::*;
pub use sequencer::*;
pub use sink::*;
