pub mod ranging;
