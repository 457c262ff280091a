use image::imageops::FilterType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const THUMB_W: u32 = 48;
const THUMB_H: u32 = 48;

/// Compact RGB thumbnail stored in the in-memory cache.
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// RGB pixels in row-major order (len = w*h*3)
    pub pixels: Vec<u8>,
}

enum Slot {
    Pending,
    Ready(SpriteThumb),
    Missing,
}

#[derive(Default)]
struct Slots {
    // bumped by `clear` so downloads started earlier are not stored
    epoch: u64,
    by_id: HashMap<u32, Slot>,
}

/// Sprites keyed by pokédex id, downloaded the first time they are shown.
#[derive(Clone, Default)]
pub struct SpriteCache {
    slots: Arc<Mutex<Slots>>,
}

impl SpriteCache {
    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a background download of `url` unless `id` was already requested.
    pub fn request(&self, client: &reqwest::Client, id: u32, url: &str) {
        let epoch = {
            let mut slots = self.slots();
            if slots.by_id.contains_key(&id) {
                return;
            }
            slots.by_id.insert(id, Slot::Pending);
            slots.epoch
        };

        let cache = self.clone();
        let client = client.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let slot = match download(&client, &url).await {
                Ok(thumb) => Slot::Ready(thumb),
                Err(e) => {
                    tracing::warn!(id, url = %url, error = %e, "failed to load sprite");
                    Slot::Missing
                }
            };
            let mut slots = cache.slots();
            if slots.epoch == epoch {
                slots.by_id.insert(id, slot);
            }
        });
    }

    /// Forgets every sprite, including downloads still in flight.
    pub fn clear(&self) {
        let mut slots = self.slots();
        slots.epoch += 1;
        slots.by_id.clear();
    }

    #[cfg(test)]
    fn insert(&self, id: u32, thumb: SpriteThumb) {
        self.slots().by_id.insert(id, Slot::Ready(thumb));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots().by_id.len()
    }

    pub fn is_pending(&self, id: u32) -> bool {
        matches!(self.slots().by_id.get(&id), Some(Slot::Pending))
    }

    /// Pixel rows sized `w` x `h` for a cached sprite.
    ///
    /// Matches the thumbnail size directly, otherwise resizes in memory from
    /// the thumbnail.
    pub fn pixels(&self, id: u32, w: u32, h: u32) -> Option<Vec<Vec<(u8, u8, u8)>>> {
        let slots = self.slots();
        let Some(Slot::Ready(thumb)) = slots.by_id.get(&id) else {
            return None;
        };

        if thumb.w == w && thumb.h == h {
            let mut rows: Vec<Vec<(u8, u8, u8)>> = Vec::with_capacity(h as usize);
            for y in 0..h {
                let mut row = Vec::with_capacity(w as usize);
                let row_start = (y * w * 3) as usize;
                for x in 0..w {
                    let idx = row_start + (x as usize) * 3;
                    row.push((thumb.pixels[idx], thumb.pixels[idx + 1], thumb.pixels[idx + 2]));
                }
                rows.push(row);
            }
            return Some(rows);
        }

        let mut buf = image::RgbaImage::new(thumb.w, thumb.h);
        for y in 0..thumb.h {
            for x in 0..thumb.w {
                let idx = ((y * thumb.w + x) * 3) as usize;
                let (r, g, b) = (thumb.pixels[idx], thumb.pixels[idx + 1], thumb.pixels[idx + 2]);
                buf.put_pixel(x, y, image::Rgba([r, g, b, 255]));
            }
        }
        let resized = image::imageops::resize(&buf, w, h, FilterType::Lanczos3);
        let mut rows: Vec<Vec<(u8, u8, u8)>> = Vec::with_capacity(resized.height() as usize);
        for y in 0..resized.height() {
            let mut row = Vec::with_capacity(resized.width() as usize);
            for x in 0..resized.width() {
                let p = resized.get_pixel(x, y);
                row.push((p[0], p[1], p[2]));
            }
            rows.push(row);
        }
        Some(rows)
    }
}

#[derive(Debug, thiserror::Error)]
enum SpriteError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Decode(#[from] image::ImageError),
}

async fn download(client: &reqwest::Client, url: &str) -> Result<SpriteThumb, SpriteError> {
    let bytes = client.get(url).send().await?.error_for_status()?.bytes().await?;
    Ok(thumbnail(&bytes)?)
}

/// Decodes an image and shrinks it to the canonical thumbnail size.
pub fn thumbnail(bytes: &[u8]) -> Result<SpriteThumb, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let small = image::imageops::resize(&img.to_rgba8(), THUMB_W, THUMB_H, FilterType::Lanczos3);
    let mut pixels = Vec::with_capacity((THUMB_W * THUMB_H * 3) as usize);
    for p in small.pixels() {
        pixels.extend_from_slice(&[p[0], p[1], p[2]]);
    }
    Ok(SpriteThumb {
        w: THUMB_W,
        h: THUMB_H,
        pixels,
    })
}
