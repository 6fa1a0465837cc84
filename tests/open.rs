use allcode_link::{car::Car, error::Error, platform::Platform};

#[test]
fn unsupported_platform_touches_nothing() {
    // No runtime here: resolving must fail before any device is opened.
    let mut car = Car::new();

    let err = car
        .open_on(&Platform::Other("plan9".into()), 1)
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedPlatform(os) if os == "plan9"));
    assert!(!car.is_open());
}

#[test]
fn opening_outside_a_runtime_is_an_error() {
    use allcode_link::serial::error::ConnectionError;

    let mut car = Car::new();

    let err = car.open_path("/dev/rfcomm0").unwrap_err();

    assert!(matches!(
        err,
        Error::Connection(ConnectionError::NoRuntime)
    ));
    assert!(!car.is_open());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn missing_device_is_a_connection_error() {
    use allcode_link::serial::error::ConnectionError;

    let mut car = Car::new();

    let err = car.open_on(&Platform::Linux, 987_654).unwrap_err();

    match err {
        Error::Connection(ConnectionError::Open { path, .. }) => {
            assert_eq!(path, "/dev/rfcomm987654")
        }
        other => panic!("Unexpected {other:?}"),
    }
    assert!(!car.is_open());
}

#[tokio::test]
async fn close_without_open_is_fine() {
    let mut car = Car::new();

    car.close().await.unwrap();
    assert_eq!(car.device_path(), None);
}
