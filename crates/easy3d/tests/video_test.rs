//! Recording a camera path into an animation.

use std::fs::File;
use std::io::BufReader;

use easy3d::*;
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;

#[test]
fn test_record_camera_path() {
    let _ = initialize();
    let dir = std::env::temp_dir().join(format!("easy3d_video_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let mesh = SurfaceMesh::from_polygons(
        "tri",
        [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::Y],
        [[0, 1, 2]],
    )
    .unwrap();
    let mut viewer = Viewer::new("video", 64, 48);
    viewer.add_model(Box::new(mesh)).unwrap();
    viewer.fit_screen(None);

    // Two key frames one second apart.
    for dz in [0.0, 2.0] {
        viewer
            .camera_mut()
            .frame_mut()
            .frame_mut()
            .translate(Vec3::new(0.0, 0.0, dz));
        viewer.handle_event(&Event::KeyPress {
            key: Key::Char('k'),
            modifiers: Modifiers::ALT,
        });
    }
    let interpolator = viewer.camera_mut().keyframe_interpolator_mut();
    assert_eq!(interpolator.number_of_keyframes(), 2);
    interpolator.set_speed(1.0);
    let duration = interpolator.duration();
    viewer.handle_event(&Event::KeyPress {
        key: Key::Char('k'),
        modifiers: Modifiers::CTRL,
    });

    let path = dir.join("path.gif");
    let mut encoder = VideoEncoder::new(&path, 10, 2 * 1024 * 1024);
    let dt = 0.1;
    let mut frames = 0;
    while viewer.camera().is_animating() && frames < 100 {
        viewer.update(dt);
        let fb = viewer.render();
        let (w, h) = (fb.width(), fb.height());
        let pixels = fb.to_rgba8();
        encoder
            .encode(&pixels, w, h, PixelFormat::Rgba8888)
            .unwrap();
        frames += 1;
    }
    assert!(frames as f32 >= duration / dt - 1.0);
    assert_eq!(encoder.frame_count(), frames);
    assert_eq!(encoder.end().unwrap(), frames);

    let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
    let decoded = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(decoded.len(), frames);
    assert_eq!(decoded[0].buffer().dimensions(), (64, 48));

    // A frame of another size is rejected once the video has started.
    let mut encoder = VideoEncoder::new(dir.join("sizes.gif"), 25, 0);
    encoder
        .encode(&vec![0; 64 * 48 * 3], 64, 48, PixelFormat::Rgb888)
        .unwrap();
    assert!(matches!(
        encoder.encode(&vec![0; 32 * 48 * 3], 32, 48, PixelFormat::Rgb888),
        Err(VideoError::SizeChanged { .. })
    ));
    encoder.end().unwrap();

    let _ = std::fs::remove_dir_all(&dir);
}
