//! Adaptive binary range encoder and its price model.
//!
//! [`RangeEncoder`] turns bit decisions into bytes; [`price`] estimates what a
//! decision would cost without encoding it.

pub mod encoder;
pub mod price;

pub use encoder::{RangeEncoder, FLUSH_SHIFT_COUNT};
pub use price::{
    get_direct_price, get_price, get_price_0, get_price_1, get_reverse_tree_price,
    get_tree_price, init_probs, Probability, BIT_MODEL_TOTAL, BIT_PRICE, PROB_INIT_VALUE,
};
