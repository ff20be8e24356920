use std::time::{SystemTime, UNIX_EPOCH};

/// Log line timestamp, YYYY-MM-DD HH:MM:SS TZ
pub const LOG_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Compact ISO-8601 local timestamp with UTC offset, used for image labels
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Returns the current local time in the log line format
pub fn now() -> String {
    format_local(LOG_FORMAT)
}

/// Returns the current local time in the ISO format
pub fn iso_now() -> String {
    format_local(ISO_FORMAT)
}

/// Formats the current local time with a strftime pattern
#[cfg(target_family = "unix")]
pub fn format_local(fmt: &str) -> String {
    use std::ffi::{CStr, CString};

    let secs = unix_timestamp() as libc::time_t;
    let Ok(fmt) = CString::new(fmt) else {
        return String::new();
    };

    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    let mut buf = [0 as libc::c_char; 100];

    unsafe {
        if libc::localtime_r(&secs, &mut tm).is_null() {
            return String::new();
        }
        let written = libc::strftime(buf.as_mut_ptr(), buf.len(), fmt.as_ptr(), &tm);
        if written == 0 {
            return String::new();
        }
        CStr::from_ptr(buf.as_ptr()).to_string_lossy().to_string()
    }
}

/// Formats the current local time. Windows has no strftime here, so only the
/// date and time fields of the pattern are honoured.
#[cfg(target_family = "windows")]
pub fn format_local(fmt: &str) -> String {
    use windows_sys::Win32::System::Time::{GetTimeZoneInformation, TIME_ZONE_INFORMATION};
    use windows_sys::Win32::Foundation::SYSTEMTIME;

    let mut tm: SYSTEMTIME = unsafe { std::mem::zeroed() };
    let mut tz: TIME_ZONE_INFORMATION = unsafe { std::mem::zeroed() };
    unsafe {
        windows_sys::Win32::System::SystemInformation::GetLocalTime(&mut tm);
        GetTimeZoneInformation(&mut tz);
    }

    let offset_minutes = -tz.Bias;
    let zone_name = {
        let len = tz.StandardName.iter().position(|&c| c == 0).unwrap_or(0);
        String::from_utf16_lossy(&tz.StandardName[..len])
    };

    fmt.replace("%Y", &format!("{:04}", tm.wYear))
        .replace("%m", &format!("{:02}", tm.wMonth))
        .replace("%d", &format!("{:02}", tm.wDay))
        .replace("%H", &format!("{:02}", tm.wHour))
        .replace("%M", &format!("{:02}", tm.wMinute))
        .replace("%S", &format!("{:02}", tm.wSecond))
        .replace(
            "%z",
            &format!(
                "{}{:02}{:02}",
                if offset_minutes < 0 { '-' } else { '+' },
                offset_minutes.abs() / 60,
                offset_minutes.abs() % 60
            ),
        )
        .replace("%Z", &zone_name)
}

/// Returns the current Unix timestamp in seconds
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_now_shape() {
        let stamp = iso_now();
        // 2024-01-31T12:34:56+0100
        assert_eq!(stamp.len(), 24, "unexpected timestamp {:?}", stamp);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], "T");
        assert!(stamp[..4].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_unix_timestamp_is_recent() {
        // 2020-01-01
        assert!(unix_timestamp() > 1_577_836_800);
    }
}
