//! Pull adapter: converted bytes through `io::Read`.

use std::io::{self, Read};

use crate::chain::pipeline::Pipeline;
use crate::chain::sink::ByteSink;
use crate::chain::source::CharSource;
use crate::error::ConvertError;
use crate::shared::Counters;

pub struct ConverterReader<S> {
    pipeline: Option<Pipeline<S, ByteSink>>,
}

impl<S: CharSource> ConverterReader<S> {
    pub fn new(pipeline: Pipeline<S, ByteSink>) -> Self {
        Self {
            pipeline: Some(pipeline),
        }
    }

    /// Fill `buf[offset..offset + len]`, pumping the chain until output is
    /// available. Returns 0 at end of output.
    pub fn read_range(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Result<usize, ConvertError> {
        let pipeline = self.pipeline.as_mut().ok_or(ConvertError::ObjectDisposed)?;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= buf.len())
            .ok_or(ConvertError::InvalidRange {
                offset,
                len,
                buffer_len: buf.len(),
            })?;
        if pipeline.is_failed() {
            return Err(ConvertError::Poisoned);
        }
        if len == 0 {
            return Ok(0);
        }
        loop {
            let copied = pipeline.sink_mut().read_into(&mut buf[offset..end]);
            if copied > 0 {
                return Ok(copied);
            }
            if pipeline.is_done() {
                return Ok(0);
            }
            pipeline.pump()?;
        }
    }

    pub fn counters(&self) -> Option<&Counters> {
        self.pipeline.as_ref().map(Pipeline::counters)
    }

    /// Release the pipeline. Every later call fails with `ObjectDisposed`.
    pub fn close(&mut self) {
        self.pipeline = None;
    }

    pub fn is_closed(&self) -> bool {
        self.pipeline.is_none()
    }
}

impl<S: CharSource> Read for ConverterReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        self.read_range(buf, 0, len).map_err(io::Error::from)
    }
}
