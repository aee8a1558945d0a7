use crate::proto::ProtoRegistry;

/// Owner of the protocol registry and whatever transport state protocols
/// consult while probing a parameter combination. The selection core only
/// passes it through to `Protocol::init`; one worker can back any number of
/// [`ProtoSelect`](crate::select::ProtoSelect) containers (typically one per
/// endpoint/remote-key configuration pair).
pub struct Worker {
    registry: ProtoRegistry,
}

impl Worker {
    pub fn new(registry: ProtoRegistry) -> Self {
        Worker { registry }
    }

    pub fn registry(&self) -> &ProtoRegistry {
        &self.registry
    }
}
