pub(crate) mod axes_draw;
pub mod impact;
