pub mod boundary_rules;
pub mod caption;
pub mod caption_segmenter;
pub mod line_wrapper;
