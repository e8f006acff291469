use crate::overlay::{ArtworkLayer, ArtworkRef};
use anyhow::Result;
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub type DualPixelColor = (u8, u8, u8, u8, u8, u8);
pub type AsciiArtLine = (String, Vec<DualPixelColor>);

pub enum ArtworkState {
    Loading,
    Loaded(LoadedArt),
    Failed,
}

/// A decoded cover plus what the card derives from it. The average colour is
/// taken once; the resized copy is redone only when the art size changes.
pub struct LoadedArt {
    image: DynamicImage,
    average: (u8, u8, u8),
    fitted: Option<RgbImage>,
}

impl LoadedArt {
    pub fn new(image: DynamicImage) -> Self {
        let average = ArtworkRenderer::average_color(&image);
        Self {
            image,
            average,
            fitted: None,
        }
    }

    pub fn average(&self) -> (u8, u8, u8) {
        self.average
    }

    /// Resize to `width`x`height` unless the last fit already has that size.
    /// Returns true when a resize happened.
    pub fn fit(&mut self, width: u32, height: u32) -> bool {
        if self.fitted.as_ref().map(|f| f.dimensions()) == Some((width, height)) {
            return false;
        }
        self.fitted = Some(
            self.image
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgb8(),
        );
        true
    }

    pub fn fitted(&self) -> Option<&RgbImage> {
        self.fitted.as_ref()
    }
}

/// Loads cover art for the two crossfade layers.
pub struct ArtworkRenderer {
    client: Client,
}

impl ArtworkRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Location to actually load. Remote URLs get a timestamp appended so a
    /// cover re-written under the same name is not served from cache.
    pub fn resolve(art: &ArtworkRef, unix_ms: u128) -> String {
        match art {
            ArtworkRef::Remote(url) => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", url, sep, unix_ms)
            }
            ArtworkRef::Local(path) => path.clone(),
        }
    }

    pub async fn load(&self, art: &ArtworkRef) -> Result<DynamicImage> {
        match art {
            ArtworkRef::Remote(_) => {
                let unix_ms = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                self.fetch_image(&Self::resolve(art, unix_ms)).await
            }
            ArtworkRef::Local(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(image::load_from_memory(&bytes)?)
            }
        }
    }

    pub async fn fetch_image(&self, url: &str) -> Result<DynamicImage> {
        let bytes = self.client.get(url).send().await?.bytes().await?;
        let img = image::load_from_memory(&bytes)?;
        Ok(img)
    }

    /// Cross-dissolve two already fitted layers at `t` (0 = old only, 1 = new
    /// only). A missing layer, or a pixel outside it, shows `fallback`.
    pub fn blend_layers(
        old: Option<&RgbImage>,
        new: Option<&RgbImage>,
        t: f32,
        width: u32,
        height: u32,
        fallback: (u8, u8, u8),
    ) -> RgbImage {
        let t = t.clamp(0.0, 1.0);
        let fb = Rgb([fallback.0, fallback.1, fallback.2]);
        let pixel = |img: Option<&RgbImage>, x: u32, y: u32| {
            img.and_then(|i| i.get_pixel_checked(x, y)).copied().unwrap_or(fb)
        };

        RgbImage::from_fn(width, height, |x, y| {
            let a = pixel(old, x, y);
            let b = pixel(new, x, y);
            let lerp = |p: u8, q: u8| (p as f32 + (q as f32 - p as f32) * t).round() as u8;
            Rgb([lerp(a[0], b[0]), lerp(a[1], b[1]), lerp(a[2], b[2])])
        })
    }

    /// Single colour standing in for the blurred background.
    pub fn average_color(img: &DynamicImage) -> (u8, u8, u8) {
        let px = img.resize_exact(1, 1, FilterType::Triangle).to_rgb8();
        let p = px.get_pixel(0, 0);
        (p[0], p[1], p[2])
    }

    /// Half-block rows: each terminal cell carries two vertical pixels.
    pub fn render_to_lines(img: &RgbImage) -> Vec<AsciiArtLine> {
        let (width, height) = img.dimensions();
        let mut lines: Vec<AsciiArtLine> = Vec::new();

        // Process 2 rows at a time
        for y in (0..height).step_by(2) {
            let mut line_chars = String::new();
            let mut line_colors: Vec<DualPixelColor> = Vec::new();

            for x in 0..width {
                let top = img.get_pixel(x, y);
                let bottom = if y + 1 < height { img.get_pixel(x, y + 1) } else { top };

                // Upper half block (▀) with fg=top, bg=bottom
                line_chars.push('▀');
                line_colors.push((top[0], top[1], top[2], bottom[0], bottom[1], bottom[2]));
            }

            lines.push((line_chars, line_colors));
        }

        lines
    }
}

/// Decoded layers keyed by crossfade layer, trimmed to what the snapshot
/// still shows. Two swaps of the same cover path are separate entries.
#[derive(Default)]
pub struct ArtworkCache {
    entries: HashMap<ArtworkLayer, ArtworkState>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `layer` as loading. Returns false if it is already known.
    pub fn request(&mut self, layer: &ArtworkLayer) -> bool {
        if self.entries.contains_key(layer) {
            return false;
        }
        self.entries.insert(layer.clone(), ArtworkState::Loading);
        true
    }

    pub fn finish(&mut self, layer: ArtworkLayer, state: ArtworkState) {
        // A layer retired while loading stays retired.
        if let Some(slot) = self.entries.get_mut(&layer) {
            *slot = state;
        }
    }

    fn loaded(&self, layer: Option<&ArtworkLayer>) -> Option<&LoadedArt> {
        match layer.and_then(|l| self.entries.get(l)) {
            Some(ArtworkState::Loaded(art)) => Some(art),
            _ => None,
        }
    }

    pub fn is_loaded(&self, layer: Option<&ArtworkLayer>) -> bool {
        self.loaded(layer).is_some()
    }

    pub fn average(&self, layer: Option<&ArtworkLayer>) -> Option<(u8, u8, u8)> {
        self.loaded(layer).map(LoadedArt::average)
    }

    /// Bring every loaded layer in `layers` to `width`x`height`.
    pub fn fit(&mut self, layers: &[Option<&ArtworkLayer>], width: u32, height: u32) {
        for layer in layers.iter().flatten() {
            if let Some(ArtworkState::Loaded(art)) = self.entries.get_mut(*layer) {
                art.fit(width, height);
            }
        }
    }

    pub fn fitted(&self, layer: Option<&ArtworkLayer>) -> Option<&RgbImage> {
        self.loaded(layer).and_then(LoadedArt::fitted)
    }

    pub fn state(&self, layer: &ArtworkLayer) -> Option<&ArtworkState> {
        self.entries.get(layer)
    }

    pub fn retain_only(&mut self, keep: &[Option<&ArtworkLayer>]) {
        self.entries
            .retain(|k, _| keep.iter().any(|a| *a == Some(k)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([r, g, b])))
    }

    fn layer(path: &str, generation: u64) -> ArtworkLayer {
        ArtworkLayer::new(ArtworkRef::Local(path.into()), generation)
    }

    #[test]
    fn test_resolve_cache_busts_remote_only() {
        let remote = ArtworkRef::Remote("http://localhost:1608/cover.png".into());
        assert_eq!(
            ArtworkRenderer::resolve(&remote, 42),
            "http://localhost:1608/cover.png?42"
        );
        let with_query = ArtworkRef::Remote("http://x/cover?size=big".into());
        assert_eq!(ArtworkRenderer::resolve(&with_query, 7), "http://x/cover?size=big&7");
        let local = ArtworkRef::Local("/tmp/cover.png".into());
        assert_eq!(ArtworkRenderer::resolve(&local, 42), "/tmp/cover.png");
    }

    #[test]
    fn test_blend_layers() {
        let black = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));

        let start = ArtworkRenderer::blend_layers(Some(&black), Some(&white), 0.0, 2, 2, (9, 9, 9));
        assert_eq!(*start.get_pixel(0, 0), Rgb([0, 0, 0]));

        let mid = ArtworkRenderer::blend_layers(Some(&black), Some(&white), 0.5, 2, 2, (9, 9, 9));
        assert_eq!(*mid.get_pixel(1, 1), Rgb([100, 100, 100]));

        let only_new = ArtworkRenderer::blend_layers(None, Some(&white), 0.0, 2, 2, (9, 9, 9));
        assert_eq!(*only_new.get_pixel(0, 0), Rgb([9, 9, 9]));

        // Undersized layer falls back outside its bounds
        let wide = ArtworkRenderer::blend_layers(Some(&black), None, 0.0, 3, 2, (9, 9, 9));
        assert_eq!(*wide.get_pixel(2, 0), Rgb([9, 9, 9]));
    }

    #[test]
    fn test_render_to_lines_pairs_rows() {
        let img = RgbImage::from_fn(3, 3, |_, y| Rgb([y as u8, 0, 0]));
        let lines = ArtworkRenderer::render_to_lines(&img);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0.chars().count(), 3);
        assert_eq!(lines[0].1[0], (0, 0, 0, 1, 0, 0));
        // Odd last row repeats itself
        assert_eq!(lines[1].1[0], (2, 0, 0, 2, 0, 0));
    }

    #[test]
    fn test_cache_lifecycle() {
        let a = layer("a.png", 1);
        let b = layer("b.png", 2);
        let mut cache = ArtworkCache::new();

        assert!(cache.request(&a));
        assert!(!cache.request(&a));
        assert!(!cache.is_loaded(Some(&a)));

        cache.finish(a.clone(), ArtworkState::Loaded(LoadedArt::new(solid(1, 2, 3))));
        assert!(cache.is_loaded(Some(&a)));
        assert_eq!(cache.average(Some(&a)), Some((1, 2, 3)));

        cache.request(&b);
        cache.retain_only(&[Some(&b)]);
        assert!(cache.state(&a).is_none());

        // Late result for a retired layer is dropped
        cache.finish(a.clone(), ArtworkState::Failed);
        assert!(cache.state(&a).is_none());
    }

    #[test]
    fn test_same_path_new_generation_is_requested_again() {
        let mut cache = ArtworkCache::new();
        let first = layer("/home/me/tuna/cover.png", 1);
        let second = layer("/home/me/tuna/cover.png", 2);

        assert!(cache.request(&first));
        cache.finish(first.clone(), ArtworkState::Loaded(LoadedArt::new(solid(1, 1, 1))));
        assert!(cache.request(&second));
        assert!(!cache.is_loaded(Some(&second)));
    }

    #[test]
    fn test_fit_is_reused_until_size_changes() {
        let mut art = LoadedArt::new(solid(10, 20, 30));
        assert!(art.fitted().is_none());
        assert!(art.fit(2, 4));
        assert!(!art.fit(2, 4));
        assert_eq!(art.fitted().map(|f| f.dimensions()), Some((2, 4)));
        assert!(art.fit(3, 6));

        let mut cache = ArtworkCache::new();
        let l = layer("c.png", 1);
        cache.request(&l);
        cache.finish(l.clone(), ArtworkState::Loaded(art));
        cache.fit(&[Some(&l), None], 5, 5);
        assert_eq!(cache.fitted(Some(&l)).map(|f| f.dimensions()), Some((5, 5)));
    }

    #[test]
    fn test_average_color_of_solid() {
        assert_eq!(ArtworkRenderer::average_color(&solid(10, 20, 30)), (10, 20, 30));
        assert_eq!(LoadedArt::new(solid(10, 20, 30)).average(), (10, 20, 30));
    }
}
