pub mod reset_offset;
