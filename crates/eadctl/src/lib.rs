pub mod cmd_databases;
pub mod cmd_reveal;
pub mod cmd_search;
pub mod cmd_show;
pub mod cmd_tree;
pub mod common;
