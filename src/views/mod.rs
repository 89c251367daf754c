pub mod carousel;
pub mod course_detail;
pub mod course_list;
pub mod feedback;
pub mod guard;
pub mod lifecycle;
pub mod profile;
pub mod state;
