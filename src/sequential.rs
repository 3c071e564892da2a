//! Serial write pipeline.
//!
//! A dedicated worker drains a FIFO of pending writes, so an expensive
//! encoder or a slow sink blocks only the worker while producers queue.
//! Synchronous submission waits for its own completion; asynchronous
//! submission returns a [`WriteTicket`] chained after all prior work.

use crate::adapters::SharedAviMuxer;
use crate::error::{AviError, Result};
use crate::stream::StreamId;
use std::io::{Seek, Write};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

struct Job {
    data: Vec<u8>,
    is_key_frame: bool,
    done: Sender<Result<()>>,
}

/// Completion handle for an asynchronous submission.
pub struct WriteTicket {
    rx: Receiver<Result<()>>,
}

impl WriteTicket {
    /// Block until the submission has been written.
    pub fn wait(self) -> Result<()> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(AviError::config(
                "write worker terminated before completing the submission",
            )),
        }
    }
}

/// One stream's asynchronous write queue.
///
/// Submissions are performed strictly in FIFO order by a dedicated worker
/// thread; the worker is the only caller of the muxer on this stream's
/// behalf. [`finish`](AsyncStreamWriter::finish) drains the queue and joins
/// the worker; dropping the writer does the same.
pub struct AsyncStreamWriter {
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncStreamWriter {
    /// Spawn a worker writing video frames for `id`.
    pub fn video<W>(muxer: &SharedAviMuxer<W>, id: StreamId) -> Self
    where
        W: Write + Seek + Send + 'static,
    {
        let muxer = muxer.clone();
        Self::spawn(move |data, is_key_frame| muxer.write_video_frame(id, is_key_frame, data))
    }

    /// Spawn a worker writing audio blocks for `id`.
    pub fn audio<W>(muxer: &SharedAviMuxer<W>, id: StreamId) -> Self
    where
        W: Write + Seek + Send + 'static,
    {
        let muxer = muxer.clone();
        Self::spawn(move |data, _| muxer.write_audio_block(id, data))
    }

    fn spawn<F>(mut write: F) -> Self
    where
        F: FnMut(&[u8], bool) -> Result<()> + Send + 'static,
    {
        let (tx, rx) = channel::<Job>();
        let worker = thread::Builder::new()
            .name("avi-write".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    let result = write(&job.data, job.is_key_frame);
                    // A dropped ticket just means nobody is waiting.
                    let _ = job.done.send(result);
                }
            })
            .expect("failed to spawn write worker thread");

        AsyncStreamWriter {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Enqueue a write and wait for it to complete.
    pub fn write(&self, data: Vec<u8>, is_key_frame: bool) -> Result<()> {
        self.submit(data, is_key_frame)?.wait()
    }

    /// Enqueue a write and return a completion ticket.
    pub fn write_async(&self, data: Vec<u8>, is_key_frame: bool) -> Result<WriteTicket> {
        self.submit(data, is_key_frame)
    }

    fn submit(&self, data: Vec<u8>, is_key_frame: bool) -> Result<WriteTicket> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| AviError::config("write queue is closed"))?;
        let (done, rx) = channel();
        tx.send(Job {
            data,
            is_key_frame,
            done,
        })
        .map_err(|_| AviError::config("write worker is gone"))?;
        Ok(WriteTicket { rx })
    }

    /// Drain the queue and stop the worker.
    pub fn finish(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for AsyncStreamWriter {
    fn drop(&mut self) {
        self.finish();
    }
}
