/// Connection events consumed by the lifecycle loop.
///
/// These travel over an unbounded channel: sending must never fail or
/// block, because a lost event would skew the client count for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected { conn_id: String },
    Disconnected { conn_id: String },
}
