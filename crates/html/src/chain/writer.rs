//! Push adapter: raw input through `io::Write`, converted output to an
//! inner writer.

use std::io::{self, Write};

use crate::chain::Producer;
use crate::chain::pipeline::Pipeline;
use crate::chain::sink::WriteSink;
use crate::chain::source::PushSource;
use crate::error::ConvertError;
use crate::shared::Counters;

pub struct ConverterWriter<W: Write> {
    pipeline: Option<Pipeline<PushSource, WriteSink<W>>>,
    finished: bool,
}

impl<W: Write> ConverterWriter<W> {
    pub fn new(pipeline: Pipeline<PushSource, WriteSink<W>>) -> Self {
        Self {
            pipeline: Some(pipeline),
            finished: false,
        }
    }

    fn live(&mut self) -> Result<&mut Pipeline<PushSource, WriteSink<W>>, ConvertError> {
        let pipeline = self.pipeline.as_mut().ok_or(ConvertError::ObjectDisposed)?;
        if pipeline.is_failed() {
            return Err(ConvertError::Poisoned);
        }
        Ok(pipeline)
    }

    /// Convert `buf[offset..offset + len]`.
    pub fn write_range(&mut self, buf: &[u8], offset: usize, len: usize) -> Result<(), ConvertError> {
        let finished = self.finished;
        let pipeline = self.live()?;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= buf.len())
            .ok_or(ConvertError::InvalidRange {
                offset,
                len,
                buffer_len: buf.len(),
            })?;
        if finished {
            return Err(ConvertError::WriteAfterFlush);
        }
        if len == 0 {
            return Ok(());
        }
        pipeline.source_mut().push_bytes(&buf[offset..end]);
        while pipeline.pump()? {}
        Ok(())
    }

    /// Mark the end of input and push the rest of the output through.
    /// Later writes fail with `WriteAfterFlush`.
    pub fn finish(&mut self) -> Result<(), ConvertError> {
        if self.finished {
            return Ok(());
        }
        let pipeline = self.live()?;
        pipeline.source_mut().close();
        pipeline.run_to_end()?;
        self.finished = true;
        Ok(())
    }

    pub fn counters(&self) -> Option<&Counters> {
        self.pipeline.as_ref().map(Pipeline::counters)
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.pipeline.as_ref().map(|pipeline| pipeline.sink().get_ref())
    }

    /// Finish the conversion and hand back the inner writer.
    pub fn into_inner(mut self) -> Result<W, ConvertError> {
        self.finish()?;
        let pipeline = self.pipeline.take().ok_or(ConvertError::ObjectDisposed)?;
        Ok(pipeline.into_sink().into_inner())
    }

    /// Finish and release the pipeline. Every later call fails with
    /// `ObjectDisposed`.
    pub fn close(&mut self) -> Result<(), ConvertError> {
        if self.pipeline.is_none() {
            return Ok(());
        }
        let result = self.finish();
        self.pipeline = None;
        result
    }
}

impl<W: Write> Write for ConverterWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_range(buf, 0, buf.len())?;
        Ok(buf.len())
    }

    /// Convert everything written so far and flush the inner writer. The
    /// document stays open.
    fn flush(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        let pipeline = self.live()?;
        while !pipeline.flush()? {}
        Ok(())
    }
}
