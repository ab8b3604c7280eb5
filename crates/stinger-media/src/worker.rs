// crates/stinger-media/src/worker.rs
//
// PrefetchDecoder: runs a DecodeSession on its own thread and hands frames
// to the render thread through a bounded queue.
//
// The session is opened inside the thread, so no FFmpeg handle ever crosses
// threads; only owned `NormalizedFrame`s do. The queue capacity is the
// look-ahead: a full queue blocks the worker, which is the rate limiter.
//
// Restart is a command, not a shared flag. Each restart bumps a generation
// number; frames already queued carry the old generation and are discarded
// by the render side, so the first frame after a restart is always frame 0.
//
// End of stream is delivered once per generation; the worker then parks
// until the next command and the render side sees `Pending`.
//
// The first poll of a generation waits up to `first_frame_timeout` instead
// of `poll_timeout`, so the seek after a restart does not leave the
// previous run's last frame on screen.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, warn};

use stinger_core::backend::{FrameDecoder, OpenOptions};
use stinger_core::error::{Result, StingerError};
use stinger_core::media_types::{DecodeStep, FrameRate};

use crate::decode::DecodeSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// Decoded frames buffered ahead of the render thread.
    pub depth:        usize,
    /// Longest a render tick waits for a frame before holding the current one.
    pub poll_timeout: Duration,
    /// Wait for frame 0 after open or restart.
    pub first_frame_timeout: Duration,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            depth:               4,
            poll_timeout:        Duration::from_millis(20),
            first_frame_timeout: Duration::from_millis(100),
        }
    }
}

enum PrefetchCmd {
    Restart { generation: u64 },
    Stop,
}

struct Prefetched {
    generation: u64,
    step:       Result<DecodeStep>,
}

pub struct PrefetchDecoder {
    cmd_tx:              Sender<PrefetchCmd>,
    frame_rx:            Receiver<Prefetched>,
    generation:          u64,
    poll_timeout:        Duration,
    first_frame_timeout: Duration,
    /// No poll of the current generation has completed yet.
    awaiting_first:      bool,
    frame_rate:          Option<FrameRate>,
    handle:              Option<JoinHandle<()>>,
}

impl PrefetchDecoder {
    /// Spawn the worker and wait until it has opened `path`.
    ///
    /// Open errors come back here, so a bad file still fails configuration.
    pub fn open(path: &Path, options: OpenOptions, config: PrefetchConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded::<Result<Option<FrameRate>>>(1);
        let (cmd_tx, cmd_rx)     = bounded::<PrefetchCmd>(8);
        let (frame_tx, frame_rx) = bounded::<Prefetched>(config.depth.max(1));

        let worker_path: PathBuf = path.to_path_buf();
        let handle = thread::Builder::new()
            .name("stinger-prefetch".into())
            .spawn(move || {
                let session = match DecodeSession::open(&worker_path, options) {
                    Ok(s) => {
                        let _ = ready_tx.send(Ok(s.frame_rate()));
                        s
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run(session, &frame_tx, &cmd_rx);
                debug!(path = %worker_path.display(), "[prefetch] worker exited");
            })
            .map_err(|e| StingerError::Allocation(format!("prefetch thread: {e}")))?;

        let frame_rate = match ready_rx.recv() {
            Ok(result) => result?,
            Err(_) => {
                return Err(StingerError::Allocation("prefetch worker exited before opening".into()));
            }
        };

        Ok(Self {
            cmd_tx,
            frame_rx,
            generation:          0,
            poll_timeout:        config.poll_timeout,
            first_frame_timeout: config.first_frame_timeout,
            awaiting_first:      true,
            frame_rate,
            handle:              Some(handle),
        })
    }

    /// Next frame of the current generation, or `Pending` if none arrives in time.
    pub fn decode_next(&mut self) -> Result<DecodeStep> {
        let wait = if self.awaiting_first { self.first_frame_timeout } else { self.poll_timeout };
        let deadline = Instant::now() + wait;
        loop {
            match self.frame_rx.recv_deadline(deadline) {
                Ok(msg) if msg.generation != self.generation => continue,
                Ok(msg) => {
                    self.awaiting_first = false;
                    return msg.step;
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!(waited_ms = wait.as_millis() as u64, "[prefetch] no frame ready");
                    self.awaiting_first = false;
                    return Ok(DecodeStep::Pending);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(StingerError::Decode("prefetch worker stopped".into()));
                }
            }
        }
    }

    pub fn restart(&mut self) -> Result<()> {
        self.generation += 1;
        self.awaiting_first = true;
        self.cmd_tx
            .send(PrefetchCmd::Restart { generation: self.generation })
            .map_err(|_| StingerError::Decode("prefetch worker stopped".into()))
    }
}

impl FrameDecoder for PrefetchDecoder {
    fn decode_next(&mut self) -> Result<DecodeStep> {
        PrefetchDecoder::decode_next(self)
    }

    fn restart(&mut self) -> Result<()> {
        PrefetchDecoder::restart(self)
    }

    fn frame_rate(&self) -> Option<FrameRate> {
        self.frame_rate
    }
}

impl Drop for PrefetchDecoder {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(PrefetchCmd::Stop);
        // Disconnect the queue so a worker parked on a full send returns.
        drop(std::mem::replace(&mut self.frame_rx, crossbeam_channel::never()));
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("[prefetch] worker panicked");
            }
        }
    }
}

/// Worker loop. Returns on `Stop` or when either channel disconnects.
fn run(mut session: DecodeSession, frame_tx: &Sender<Prefetched>, cmd_rx: &Receiver<PrefetchCmd>) {
    let mut generation = 0u64;
    let mut ended      = false;
    let mut pending: Option<PrefetchCmd> = None;

    loop {
        let cmd = match pending.take() {
            Some(cmd) => Some(cmd),
            // Nothing left to decode: park until told to restart or stop.
            None if ended => match cmd_rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => return,
            },
            None => match cmd_rx.try_recv() {
                Ok(cmd) => Some(cmd),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return,
            },
        };

        match cmd {
            Some(PrefetchCmd::Stop) => return,
            Some(PrefetchCmd::Restart { generation: next }) => {
                generation = next;
                ended = false;
                if let Err(e) = session.restart() {
                    warn!("[prefetch] restart: {e}");
                }
                continue;
            }
            None => {}
        }

        let step = session.decode_next();
        ended = matches!(step, Ok(DecodeStep::EndOfStream));
        let msg = Prefetched { generation, step };

        select! {
            send(frame_tx, msg) -> sent => {
                if sent.is_err() { return; }
            }
            recv(cmd_rx) -> cmd => match cmd {
                Ok(cmd) => pending = Some(cmd),
                Err(_)  => return,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, luma_for};

    const OPTIONS: OpenOptions = OpenOptions { hw_decode: false, force_scale: false, prefetch: true };

    fn config() -> PrefetchConfig {
        PrefetchConfig {
            depth:               2,
            poll_timeout:        Duration::from_millis(500),
            first_frame_timeout: Duration::from_millis(500),
        }
    }

    fn first_luma(step: DecodeStep) -> u8 {
        match step {
            DecodeStep::Frame(f) => f.planes[0].data[0],
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn frames_arrive_in_order_then_end() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixtures::write_y4m(dir.path(), "p.y4m", 8, 8, 3);
        let mut pf = PrefetchDecoder::open(&path, OPTIONS, config()).unwrap();
        assert_eq!(pf.frame_rate(), FrameRate::new(25, 1));

        for i in 0..3 {
            assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(i));
        }
        assert!(matches!(pf.decode_next().unwrap(), DecodeStep::EndOfStream));
    }

    #[test]
    fn restart_discards_queued_frames() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixtures::write_y4m(dir.path(), "r.y4m", 8, 8, 6);
        let mut pf = PrefetchDecoder::open(&path, OPTIONS, config()).unwrap();

        assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(0));
        assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(1));
        pf.restart().unwrap();
        assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(0));
        assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(1));
    }

    #[test]
    fn first_frame_of_a_run_is_waited_for() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixtures::write_y4m(dir.path(), "w.y4m", 64, 64, 8);
        // Later polls never wait, only the first of each generation does.
        let config = PrefetchConfig {
            depth:               2,
            poll_timeout:        Duration::ZERO,
            first_frame_timeout: Duration::from_secs(5),
        };
        let mut pf = PrefetchDecoder::open(&path, OPTIONS, config).unwrap();
        assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(0));

        // Let the queue fill with frames of the old run, then restart.
        thread::sleep(Duration::from_millis(50));
        pf.restart().unwrap();
        assert_eq!(first_luma(pf.decode_next().unwrap()), luma_for(0));
    }

    #[test]
    fn open_error_is_synchronous() {
        fixtures::init();
        let dir = tempfile::tempdir().unwrap();
        let result = PrefetchDecoder::open(&dir.path().join("gone.webm"), OPTIONS, config());
        assert!(matches!(result, Err(StingerError::Open { .. })));
    }

    #[test]
    fn drop_stops_a_blocked_worker() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixtures::write_y4m(dir.path(), "b.y4m", 8, 8, 20);
        let pf = PrefetchDecoder::open(&path, OPTIONS, config()).unwrap();
        // Give the worker time to fill the queue and block on send.
        thread::sleep(Duration::from_millis(50));
        drop(pf);
    }
}
