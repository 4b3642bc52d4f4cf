use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::trace;

/// Produces a displayable icon for a file, as a `data:` URL.
pub trait IconSource {
    fn extract(&self, path: &str) -> Option<String>;
}

/// Yields no icons; callers fall back to a generic glyph.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

impl IconSource for NoIcons {
    fn extract(&self, _path: &str) -> Option<String> {
        None
    }
}

#[cfg(windows)]
pub use shell::ShellIconSource;

#[cfg(windows)]
pub type PlatformIconSource = ShellIconSource;
#[cfg(not(windows))]
pub type PlatformIconSource = NoIcons;

/// Memoizes icons by path for the life of the process. Only successful
/// extractions are kept; there is no eviction.
pub struct IconCache<S = PlatformIconSource> {
    source: S,
    entries: RwLock<HashMap<String, String>>,
}

impl Default for IconCache<PlatformIconSource> {
    fn default() -> Self {
        Self::new(PlatformIconSource::default())
    }
}

impl<S: IconSource> IconCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the icon for a path, extracting on demand if not cached.
    pub fn get(&self, path: &str) -> Option<String> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(icon) = entries.get(path) {
                return Some(icon.clone());
            }
        }

        let icon = self.source.extract(path)?;
        trace!(path, "icon extracted");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), icon.clone());
        Some(icon)
    }

    /// Batch version of `get`; paths without an icon are left out.
    pub fn get_batch(&self, paths: &[String]) -> HashMap<String, String> {
        paths
            .iter()
            .filter_map(|path| self.get(path).map(|icon| (path.clone(), icon)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(windows)]
mod shell {
    use base64::Engine;
    use windows::Win32::Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC,
        DeleteObject, GetDIBits,
    };
    use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
    use windows::Win32::UI::Shell::{SHFILEINFOW, SHGFI_ICON, SHGFI_SMALLICON, SHGetFileInfoW};
    use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};

    use super::IconSource;

    const ICON_SIZE: u32 = 16;

    /// Small shell icons via `SHGetFileInfoW`, encoded as PNG.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ShellIconSource;

    impl IconSource for ShellIconSource {
        fn extract(&self, path: &str) -> Option<String> {
            let bgra = extract_bgra(path)?;
            let png = bgra_to_png(&bgra)?;
            Some(format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(png)
            ))
        }
    }

    fn extract_bgra(path: &str) -> Option<Vec<u8>> {
        unsafe {
            let wide_path: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();

            let mut shfi = SHFILEINFOW::default();
            let result = SHGetFileInfoW(
                windows::core::PCWSTR(wide_path.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut shfi),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_ICON | SHGFI_SMALLICON,
            );

            if result == 0 || shfi.hIcon.is_invalid() {
                return None;
            }

            let pixels = hicon_to_bgra(shfi.hIcon);
            let _ = DestroyIcon(shfi.hIcon);
            pixels
        }
    }

    fn hicon_to_bgra(hicon: HICON) -> Option<Vec<u8>> {
        unsafe {
            let mut icon_info = ICONINFO::default();
            if GetIconInfo(hicon, &mut icon_info).is_err() {
                return None;
            }
            let _cleanup = BitmapCleanup(&icon_info);

            let hdc = CreateCompatibleDC(None);
            if hdc.is_invalid() {
                return None;
            }

            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: ICON_SIZE as i32,
                    biHeight: -(ICON_SIZE as i32),
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut pixels = vec![0u8; (ICON_SIZE * ICON_SIZE * 4) as usize];

            // GetDIBits requires the bitmap not be selected into any DC.
            if !icon_info.hbmColor.is_invalid() {
                GetDIBits(
                    hdc,
                    icon_info.hbmColor,
                    0,
                    ICON_SIZE,
                    Some(pixels.as_mut_ptr() as *mut _),
                    &mut bmi,
                    DIB_RGB_COLORS,
                );
            }

            let _ = DeleteDC(hdc);

            if pixels.iter().all(|&b| b == 0) {
                return None;
            }
            Some(pixels)
        }
    }

    struct BitmapCleanup<'a>(&'a ICONINFO);

    impl Drop for BitmapCleanup<'_> {
        fn drop(&mut self) {
            unsafe {
                if !self.0.hbmColor.is_invalid() {
                    let _ = DeleteObject(self.0.hbmColor.into());
                }
                if !self.0.hbmMask.is_invalid() {
                    let _ = DeleteObject(self.0.hbmMask.into());
                }
            }
        }
    }

    fn bgra_to_png(bgra: &[u8]) -> Option<Vec<u8>> {
        let mut rgba = Vec::with_capacity(bgra.len());
        for px in bgra.chunks_exact(4) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }

        let mut png_buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_buf, ICON_SIZE, ICON_SIZE);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().ok()?;
            writer.write_image_data(&rgba).ok()?;
        }
        Some(png_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl IconSource for CountingSource {
        fn extract(&self, path: &str) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            if path.ends_with(".exe") {
                Some(format!("data:image/png;base64,{}", path.len()))
            } else {
                None
            }
        }
    }

    fn counting() -> IconCache<CountingSource> {
        IconCache::new(CountingSource {
            calls: Cell::new(0),
        })
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let cache = counting();
        let first = cache.get("C:\\app.exe");
        let second = cache.get("C:\\app.exe");

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(cache.source.calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = counting();
        assert!(cache.get("C:\\readme.txt").is_none());
        assert!(cache.get("C:\\readme.txt").is_none());

        assert_eq!(cache.source.calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn batch_skips_paths_without_icons() {
        let cache = counting();
        let paths = vec!["C:\\a.exe".to_string(), "C:\\b.lnk".to_string()];
        let icons = cache.get_batch(&paths);

        assert_eq!(icons.len(), 1);
        assert!(icons.contains_key("C:\\a.exe"));
    }

    #[test]
    fn no_icons_source_yields_nothing() {
        let cache = IconCache::new(NoIcons);
        assert!(cache.get("C:\\app.exe").is_none());
        assert!(cache.is_empty());
    }
}
