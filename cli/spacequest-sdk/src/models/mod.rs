pub mod debounce;
pub mod entity;
pub mod filter;
pub mod resource_list;
pub mod view;
