pub mod ghost_list;

pub use ghost_list::GhostList;
