mod helper;
mod simulation;
