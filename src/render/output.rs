use image::{ImageFormat, RgbaImage};
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use voxmap_common::{MapError, Result};
use voxmap_logger::{log, LogSeverity};

pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|err| MapError::ImageError(format!("{}: {}", path.display(), err)))
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// Starts `cmd` detached from our stdio. A background thread waits on the
/// child so it never lingers as a zombie.
fn launch(mut cmd: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || child.wait()))
}

/// Asks the desktop to show `path`. Returns whether a viewer was launched.
pub fn open_in_viewer(path: &Path) -> bool {
    match launch(viewer_command(path)) {
        Ok(_) => true,
        Err(err) => {
            log(
                format!("Could not open {}: {}", path.display(), err),
                LogSeverity::Warning,
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn test_png_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 200]));
        save_png(&img, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let img = RgbaImage::new(1, 1);
        assert!(save_png(&img, &path).is_err());
    }

    #[test]
    fn test_missing_program_is_not_launched() {
        assert!(launch(Command::new("voxmap-no-such-viewer")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_launched_child_is_reaped() {
        let waiter = launch(Command::new("true")).unwrap();
        let status = waiter.join().unwrap().unwrap();
        assert!(status.success());
    }
}
