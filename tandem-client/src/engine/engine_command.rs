use tandem_core::RoomId;

/// Commands from the application to the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    /// Send `join-room` for this room.
    Join(RoomId),

    /// Tear every session down and stop the engine.
    Leave,
}
