pub mod grouping;
pub mod style;
pub mod template_set;
