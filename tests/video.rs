extern crate ffmpeg_next as ffmpeg;

use std::path::{Path, PathBuf};

use ffmpeg::codec::context::Context as AvContext;
use ffmpeg::codec::encoder::video::Encoder as AvEncoder;
use ffmpeg::codec::packet::Packet as AvPacket;
use ffmpeg::codec::Id as AvCodecId;
use ffmpeg::format::context::Output as AvOutput;
use ffmpeg::util::format::Pixel as AvPixel;
use ffmpeg::util::frame::video::Video as AvFrame;
use ffmpeg::Rational as AvRational;

use ndarray::{s, Axis};

use video_index::{Error, Frame, Location, Video};

const FRAMES: usize = 10;
const WIDTH: u32 = 4;
const HEIGHT: u32 = 4;

/// Luma of frame `index`. Grows with the index, so frames can be told apart after decoding.
fn luma(index: usize) -> u8 {
    (50 + 15 * index) as u8
}

/// Encoding of a fixture clip.
struct Encoding {
    codec: AvCodecId,
    width: u32,
    height: u32,
    /// Keyframe interval. `None` keeps the encoder default.
    gop: Option<u32>,
}

/// Lossless and intra-only: every frame is a keyframe.
const FFV1: Encoding = Encoding {
    codec: AvCodecId::FFV1,
    width: WIDTH,
    height: HEIGHT,
    gop: None,
};

/// One keyframe every four frames, the rest predicted from the previous frame.
const MPEG4_GOP4: Encoding = Encoding {
    codec: AvCodecId::MPEG4,
    width: 16,
    height: 16,
    gop: Some(4),
};

/// Write an AVI clip of `FRAMES` frames at 1 fps. Every frame is a flat color with a red tint
/// (raised Cr) and a luma given by [`luma`].
fn write_fixture(path: &Path, encoding: &Encoding) {
    ffmpeg::init().unwrap();

    let time_base = AvRational::new(1, 1);
    let codec = ffmpeg::encoder::find(encoding.codec).expect("encoder");
    let mut output = ffmpeg::format::output(&path).unwrap();

    let mut encoder = AvContext::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();
    encoder.set_width(encoding.width);
    encoder.set_height(encoding.height);
    encoder.set_format(AvPixel::YUV420P);
    encoder.set_time_base(time_base);
    encoder.set_frame_rate(Some(time_base));
    if let Some(gop) = encoding.gop {
        encoder.set_gop(gop);
        encoder.set_max_b_frames(0);
    }
    let mut encoder = encoder.open_as(codec).unwrap();

    {
        let mut stream = output.add_stream(codec).unwrap();
        stream.set_parameters(&encoder);
        stream.set_time_base(time_base);
    }
    output.write_header().unwrap();
    let stream_time_base = output.stream(0).unwrap().time_base();

    for index in 0..FRAMES {
        let mut frame = AvFrame::new(AvPixel::YUV420P, encoding.width, encoding.height);
        frame.data_mut(0).fill(luma(index));
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(160);
        frame.set_pts(Some(index as i64));
        encoder.send_frame(&frame).unwrap();
        write_packets(&mut encoder, &mut output, time_base, stream_time_base);
    }
    encoder.send_eof().unwrap();
    write_packets(&mut encoder, &mut output, time_base, stream_time_base);

    output.write_trailer().unwrap();
}

fn write_packets(
    encoder: &mut AvEncoder,
    output: &mut AvOutput,
    encoder_time_base: AvRational,
    stream_time_base: AvRational,
) {
    let mut packet = AvPacket::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(0);
        packet.rescale_ts(encoder_time_base, stream_time_base);
        packet.write_interleaved(output).unwrap();
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

fn fixture() -> Fixture {
    fixture_with(&FFV1)
}

fn fixture_with(encoding: &Encoding) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("synthetic.avi");
    write_fixture(&path, encoding);
    Fixture { _dir: dir, path }
}

fn open(fixture: &Fixture) -> Video {
    video_index::init().unwrap();
    Video::new(fixture.path.as_path()).unwrap()
}

fn green(frame: &Frame) -> u8 {
    frame[[0, 0, 1]]
}

#[test]
fn metadata_of_synthetic_video() {
    let fixture = fixture();
    let video = open(&fixture);

    assert_eq!(video.len(), FRAMES);
    assert_eq!(video.shape(), (10, 4, 4, 3));
    assert_eq!(video.width(), 4);
    assert_eq!(video.height(), 4);
    assert!((video.fps() - 1.0).abs() < 1e-6, "fps {}", video.fps());
    assert_eq!(
        video.source(),
        &Location::File {
            path: fixture.path.clone()
        }
    );
}

#[test]
fn reads_first_and_last_frame() {
    let fixture = fixture();
    let mut video = open(&fixture);

    let first = video.read_frame(0).unwrap();
    let last = video.read_frame(9).unwrap();
    assert_eq!(first.dim(), (4, 4, 3));
    assert_eq!(last.dim(), (4, 4, 3));
    assert!(green(&last) > green(&first));
}

#[test]
fn out_of_range_index_names_range() {
    let fixture = fixture();
    let mut video = open(&fixture);

    let err = video.read_frame(10).unwrap_err();
    assert!(matches!(err, Error::Index { index: 10, len: 10 }));
    assert_eq!(err.to_string(), "index 10 is out of range of [0,10)");
    assert!(matches!(video.read_frame(-1), Err(Error::Index { .. })));
}

#[test]
fn slice_equals_individual_reads() {
    let fixture = fixture();
    let mut video = open(&fixture);

    let frames = video.get(2..5).unwrap().into_frames().unwrap();
    assert_eq!(frames.dim(), (3, 4, 4, 3));
    for (position, index) in (2..5).enumerate() {
        let single = video.read_frame(index).unwrap();
        assert_eq!(frames.slice(s![position, .., .., ..]), single);
    }
}

#[test]
fn random_access_lands_on_requested_frames() {
    assert_random_access_lands_on_requested_frames(&fixture());
}

#[test]
fn random_access_decodes_forward_from_keyframes() {
    // Frames 2, 5, 6, 7 and 9 are not keyframes, so reaching them after a seek means decoding
    // forward from frame 0, 4 or 8 and discarding what comes before.
    let fixture = fixture_with(&MPEG4_GOP4);
    {
        let video = open(&fixture);
        assert_eq!(video.shape(), (10, 16, 16, 3));
    }
    assert_random_access_lands_on_requested_frames(&fixture);
}

fn assert_random_access_lands_on_requested_frames(fixture: &Fixture) {
    let mut video = open(fixture);

    let order = [7, 2, 9, 0, 5, 5, 6, 1];
    let greens: Vec<(i64, u8)> = order
        .iter()
        .map(|&index| (index, green(&video.read_frame(index).unwrap())))
        .collect();

    let data = video.data().unwrap();
    for (index, value) in greens {
        assert_eq!(data[[index as usize, 0, 0, 1]], value, "frame {index}");
    }
    for index in 1..FRAMES {
        assert!(
            data[[index, 0, 0, 1]] > data[[index - 1, 0, 0, 1]],
            "frames must be in order"
        );
    }
}

#[test]
fn channels_are_rgb() {
    let fixture = fixture();
    let mut video = open(&fixture);

    // The fixture is tinted red, so red must dominate blue.
    let frame = video.read_frame(3).unwrap();
    assert!(
        frame[[0, 0, 0]] > frame[[0, 0, 2]],
        "{:?}",
        frame.slice(s![0, 0, ..])
    );
}

#[test]
fn data_has_shape_of_video() {
    let fixture = fixture();
    let mut video = open(&fixture);

    let data = video.data().unwrap();
    assert_eq!(data.dim(), video.shape());
    assert_eq!(data.len_of(Axis(0)), video.len());

    let streamed: Vec<Frame> = video.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(streamed.len(), FRAMES);
    for (index, frame) in streamed.iter().enumerate() {
        assert_eq!(data.index_axis(Axis(0), index), *frame);
    }
}

#[test]
fn reads_fail_after_close() {
    let fixture = fixture();
    let mut video = open(&fixture);

    video.read_frame(0).unwrap();
    video.close().unwrap();
    assert!(matches!(video.read_frame(0), Err(Error::Closed)));
    assert!(matches!(video.get(0..3), Err(Error::Closed)));
    assert!(matches!(video.data(), Err(Error::Closed)));
    assert!(matches!(video.close(), Err(Error::Closed)));
    assert_eq!(video.len(), FRAMES);
}

#[test]
fn missing_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.avi");

    match Video::new(path.as_path()) {
        Err(Error::Open { source, .. }) => assert_eq!(source, Location::from(path.as_path())),
        Err(err) => panic!("expected open error, got {err}"),
        Ok(_) => panic!("expected open error"),
    }
}
