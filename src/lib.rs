/*
Realign - misaligned factory robots vs. timed directive quizzes
*/
pub mod actors;
pub mod ai;
pub mod dialogue;
pub mod factory;
pub mod interact;
pub mod map;
pub mod outcome;
pub mod player;
pub mod quiz;
pub mod robots;
pub mod world;
