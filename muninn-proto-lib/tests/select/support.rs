use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use muninn_proto_lib::{
    CfgThresh, DtClass, InitError, InitRequest, MemType, OpAttr, OpId, Perf, PerfRange, ProtoCaps,
    ProtoRegistry, Protocol, SelectParam, Worker,
};

/// Scriptable protocol for exercising the selection core: an affine cost
/// line with optional threshold override, scripted init failure, and an
/// init-call counter.
pub struct TestProto {
    name: String,
    caps: Option<ProtoCaps>,
    priv_data: Vec<u8>,
    reported_size: Option<usize>,
    init_calls: Arc<AtomicUsize>,
}

impl TestProto {
    /// Protocol with a single `[0, usize::MAX]` cost range.
    pub fn line(name: &str, overhead: f64, per_byte: f64) -> Self {
        Self::with_caps(
            name,
            ProtoCaps::new(
                0,
                vec![PerfRange { max_length: usize::MAX, perf: Perf::new(overhead, per_byte) }],
                CfgThresh::Auto,
            ),
        )
    }

    pub fn with_caps(name: &str, caps: ProtoCaps) -> Self {
        TestProto {
            name: name.to_string(),
            caps: Some(caps),
            priv_data: name.as_bytes().to_vec(),
            reported_size: None,
            init_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Protocol whose `init` always opts out.
    pub fn failing(name: &str) -> Self {
        TestProto {
            name: name.to_string(),
            caps: None,
            priv_data: Vec::new(),
            reported_size: None,
            init_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_thresh(mut self, thresh: CfgThresh) -> Self {
        if let Some(caps) = &mut self.caps {
            caps.cfg_thresh = thresh;
        }
        self
    }

    pub fn with_priv(mut self, priv_data: &[u8]) -> Self {
        self.priv_data = priv_data.to_vec();
        self
    }

    /// Lie about the private size written, to exercise the contract check.
    pub fn reporting_size(mut self, size: usize) -> Self {
        self.reported_size = Some(size);
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.init_calls)
    }
}

impl Protocol for TestProto {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(
        &self,
        _req: &InitRequest<'_>,
        priv_buf: &mut [u8],
    ) -> Result<(ProtoCaps, usize), InitError> {
        self.init_calls.fetch_add(1, Ordering::Relaxed);
        let caps = self.caps.clone().ok_or(InitError::Unsupported)?;
        let len = self.priv_data.len().min(priv_buf.len());
        priv_buf[..len].copy_from_slice(&self.priv_data[..len]);
        Ok((caps, self.reported_size.unwrap_or(len)))
    }

    fn config_str(&self, priv_data: &[u8]) -> String {
        String::from_utf8_lossy(priv_data).into_owned()
    }
}

pub fn worker_of(protos: Vec<TestProto>) -> Worker {
    let mut registry = ProtoRegistry::new();
    for proto in protos {
        registry
            .register(Box::new(proto))
            .unwrap_or_else(|e| panic!("registration failed: {e}"));
    }
    Worker::new(registry)
}

pub fn param() -> SelectParam {
    SelectParam::new(OpId::TagSend, OpAttr::empty(), DtClass::Contig, MemType::Host, 1)
}

pub fn param_with_sg(sg: usize) -> SelectParam {
    SelectParam::new(OpId::TagSend, OpAttr::empty(), DtClass::Contig, MemType::Host, sg)
}
