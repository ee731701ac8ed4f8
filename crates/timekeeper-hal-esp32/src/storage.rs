pub mod flash_state;
