pub mod coordinator_races;
