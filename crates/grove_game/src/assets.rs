//! Background sprite loading.
//!
//! Each request decodes one image on its own worker thread and reports back
//! over a channel. The handle is allocated up front so callers can refer to
//! the sprite immediately; entities only show it once the frame has drained
//! the completion. Workers always report back so the pending count settles;
//! after teardown the shared liveness flag makes `drain` discard whatever
//! arrives.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use grove_render::SpriteHandle;
use image::RgbaImage;

use crate::entities::EntityKind;
use crate::error::LoadError;

#[derive(Debug)]
pub struct LoadedSprite {
    pub kind: EntityKind,
    pub handle: SpriteHandle,
    pub path: PathBuf,
    pub image: RgbaImage,
}

type Completion = Result<LoadedSprite, LoadError>;

pub struct AssetLoader {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    alive: Arc<AtomicBool>,
    next_handle: u32,
    /// Workers that have not reported yet.
    pending: Arc<AtomicUsize>,
}

impl AssetLoader {
    pub fn new(alive: Arc<AtomicBool>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            alive,
            next_handle: 1,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn request(&mut self, kind: EntityKind, path: &Path) -> Result<SpriteHandle, LoadError> {
        let handle = SpriteHandle(self.next_handle);
        let path = path.to_path_buf();
        let tx = self.tx.clone();
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::AcqRel);

        thread::Builder::new()
            .name(format!("sprite-loader-{}", handle.0))
            .spawn(move || {
                let result = decode_sprite(&path).map(|image| LoadedSprite {
                    kind,
                    handle,
                    path,
                    image,
                });
                // receiver may already be gone
                let _ = tx.send(result);
                pending.fetch_sub(1, Ordering::AcqRel);
            })
            .map_err(|err| {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                LoadError::Worker(err)
            })?;

        self.next_handle += 1;
        log::debug!("Requested {:?} sprite as handle {}", kind, handle.0);
        Ok(handle)
    }

    /// Collect finished loads. Failures are logged and dropped; nothing is
    /// returned once the simulation has been torn down.
    pub fn drain(&mut self) -> Vec<LoadedSprite> {
        let completions: Vec<Completion> = self.rx.try_iter().collect();
        if !self.is_alive() {
            if !completions.is_empty() {
                log::debug!("Discarding {} sprite loads after teardown", completions.len());
            }
            return Vec::new();
        }

        let mut loaded = Vec::with_capacity(completions.len());
        for completion in completions {
            match completion {
                Ok(sprite) => {
                    log::info!(
                        "Loaded {:?} sprite {} ({}x{})",
                        sprite.kind,
                        sprite.path.display(),
                        sprite.image.width(),
                        sprite.image.height()
                    );
                    loaded.push(sprite);
                }
                Err(err) => log::warn!("{err}"),
            }
        }
        loaded
    }
}

fn decode_sprite(path: &Path) -> Result<RgbaImage, LoadError> {
    let image = image::open(path).map_err(|source| LoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}
