use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use hunkdisk::hnk::{Codec, HnkFile, HnkWriter, WriterOptions};
use hunkdisk::{AnyReader, BlockConfig, BlockReader, Error, HunkDiskReader, ImageFormat};

const HUNK_SIZE: u32 = 19_528;

fn image_bytes(len: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9u32;
    (0..len)
        .map(|i| {
            // Mostly compressible, but distinct per position.
            if i % 64 == 0 {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            }
            (state >> 24) as u8 ^ (i % 7) as u8
        })
        .collect()
}

fn pack(dir: &Path, name: &str, data: &[u8], codec: Codec) -> PathBuf {
    let path = dir.join(name);
    HnkWriter::new(WriterOptions {
        hunk_size: HUNK_SIZE,
        codec,
        level: 1,
    })
    .unwrap()
    .write(data, &path)
    .unwrap();
    path
}

fn corrupt_hunk(path: &Path, index: u32) {
    let entry = HnkFile::open(path).unwrap().entry(index).unwrap();
    let mut bytes = std::fs::read(path).unwrap();
    let start = entry.offset as usize;
    let end = start + entry.length as usize;
    bytes[start..end].fill(0xA5);
    std::fs::write(path, bytes).unwrap();
}

fn open_hnk(path: &Path) -> HunkDiskReader {
    let mut reader: HunkDiskReader = HunkDiskReader::new();
    reader.open(path).unwrap();
    reader
}

#[test]
fn sector_ten_reads_from_second_hunk() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(HUNK_SIZE as usize * 3);
    let path = pack(dir.path(), "disc.hnk", &data, Codec::Zstd);

    let mut reader = open_hnk(&path);
    let mut buf = vec![0u8; 2048];
    assert_eq!(reader.read_sync(&mut buf, 10, 1), 2048);

    let file = HnkFile::open(&path).unwrap();
    let mut hunk = vec![0u8; HUNK_SIZE as usize];
    file.read_hunk(1, &mut hunk).unwrap();
    assert_eq!(&buf[..], &hunk[952..952 + 2048]);
}

#[test]
fn hunk_boundary_read_matches_independent_hunks() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(HUNK_SIZE as usize * 4);
    let path = pack(dir.path(), "disc.hnk", &data, Codec::Deflate);

    let file = HnkFile::open(&path).unwrap();
    let mut hunk2 = vec![0u8; HUNK_SIZE as usize];
    let mut hunk3 = vec![0u8; HUNK_SIZE as usize];
    file.read_hunk(2, &mut hunk2).unwrap();
    file.read_hunk(3, &mut hunk3).unwrap();

    // One-byte sectors make it possible to start on the last byte of hunk 2.
    let mut reader = open_hnk(&path);
    reader.set_block_size(1);
    let last_of_hunk2 = 3 * HUNK_SIZE - 1;

    let mut buf = vec![0u8; 101];
    assert_eq!(reader.read_sync(&mut buf, last_of_hunk2, 101), 101);
    assert_eq!(buf[0], hunk2[HUNK_SIZE as usize - 1]);
    assert_eq!(&buf[1..], &hunk3[..100]);
}

#[test]
fn full_image_reads_back_through_every_codec() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(2048 * 40);

    for (name, codec) in [("s.hnk", Codec::Store), ("d.hnk", Codec::Deflate), ("z.hnk", Codec::Zstd)] {
        let path = pack(dir.path(), name, &data, codec);
        let mut reader = open_hnk(&path);
        assert_eq!(reader.block_count(), 40);

        let mut buf = vec![0u8; data.len()];
        assert_eq!(reader.read_sync(&mut buf, 0, 40), data.len(), "{codec}");
        assert_eq!(buf, data, "{codec}");
    }
}

#[test]
fn corrupted_hunk_ends_the_read_early() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(HUNK_SIZE as usize * 3);
    let path = pack(dir.path(), "disc.hnk", &data, Codec::Zstd);
    corrupt_hunk(&path, 1);

    let mut reader = open_hnk(&path);

    // Sector 8 starts at byte 16384 in hunk 0, so 3144 bytes come from hunk 0.
    let mut buf = vec![0u8; 2048 * 4];
    let read = reader.read_sync(&mut buf, 8, 4);
    assert_eq!(read, HUNK_SIZE as usize - 16_384);
    assert_eq!(&buf[..read], &data[16_384..HUNK_SIZE as usize]);

    // A read that starts in the broken hunk returns nothing.
    assert_eq!(reader.read_sync(&mut buf, 10, 1), 0);

    // Later hunks are still reachable.
    let sector = (2 * HUNK_SIZE).div_ceil(2048);
    assert_eq!(reader.read_sync(&mut buf, sector, 1), 2048);

    let stats = reader.cache_stats().unwrap();
    assert_eq!(stats.failures, 2);
}

#[test]
fn hunk_count_index_reads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(HUNK_SIZE as usize * 2);
    let path = pack(dir.path(), "disc.hnk", &data, Codec::Zstd);

    let mut reader = open_hnk(&path);
    reader.set_block_size(HUNK_SIZE);

    let mut buf = vec![0u8; HUNK_SIZE as usize];
    assert_eq!(reader.read_sync(&mut buf, 1, 1), HUNK_SIZE as usize);
    assert_eq!(reader.read_sync(&mut buf, 2, 1), 0);
    assert_eq!(reader.cache_stats().unwrap().rejected, 1);
}

#[test]
fn block_count_follows_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(100_000);
    let path = pack(dir.path(), "disc.hnk", &data, Codec::Zstd);

    let mut reader = open_hnk(&path);
    assert_eq!(reader.block_count(), 100_000 / 2048);

    reader.set_block_size(2352);
    assert_eq!(reader.block_count(), 100_000 / 2352);

    reader.set_data_offset(5000);
    assert_eq!(reader.block_count(), (100_000 - 5000) / 2352);

    reader.set_data_offset(200_000);
    assert_eq!(reader.block_count(), 0);

    reader.close();
    assert_eq!(reader.block_count(), 0);
    assert_eq!(reader.config().block_size, 2352);
}

#[test]
fn open_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let first = pack(dir.path(), "first.hnk", &image_bytes(50_000), Codec::Zstd);
    let second = pack(dir.path(), "second.hnk", &image_bytes(70_000), Codec::Zstd);
    let bogus = dir.path().join("bogus.hnk");
    std::fs::write(&bogus, vec![0u8; 1000]).unwrap();

    let mut reader: HunkDiskReader = HunkDiskReader::new();
    reader.close();
    reader.close();

    reader.open(&first).unwrap();
    reader.open(&second).unwrap();
    assert_eq!(reader.path(), Some(second.as_path()));
    assert_eq!(reader.geometry().unwrap().logical_size(), 70_000);

    assert!(reader.open(&bogus).is_err());
    assert!(!reader.is_open());
    assert!(reader.geometry().is_none());
    assert!(reader.path().is_none());

    let mut buf = vec![0u8; 2048];
    assert_eq!(reader.read_sync(&mut buf, 0, 1), 0);

    assert!(reader.open(Path::new("/nonexistent/disc.hnk")).is_err());
    assert!(!reader.is_open());

    reader.open(&first).unwrap();
    assert!(reader.is_open());
    reader.close();
    reader.close();
    assert!(!reader.is_open());
}

#[test]
fn probe_accepts_only_real_containers() {
    let dir = tempfile::tempdir().unwrap();
    let good = pack(dir.path(), "good.hnk", &image_bytes(10_000), Codec::Zstd);

    let wrong_ext = dir.path().join("good.dat");
    std::fs::copy(&good, &wrong_ext).unwrap();

    let rejected = dir.path().join("rejected.hnk");
    let mut bytes = std::fs::read(&good).unwrap();
    bytes[8] = 0xFF; // version
    std::fs::write(&rejected, bytes).unwrap();

    assert!(HunkDiskReader::<HnkFile>::probe(&good));
    assert!(!HunkDiskReader::<HnkFile>::probe(&wrong_ext));
    assert!(!HunkDiskReader::<HnkFile>::probe(&rejected));
    assert!(!HunkDiskReader::<HnkFile>::probe(&dir.path().join("absent.hnk")));
}

#[test]
fn begin_and_finish_read() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(HUNK_SIZE as usize * 2);
    let path = pack(dir.path(), "disc.hnk", &data, Codec::Zstd);

    let mut reader = open_hnk(&path);
    assert_eq!(reader.finish_read(), None);

    let mut buf = vec![0u8; 4096];
    let mut handle = reader.begin_read(&mut buf, 9, 2);
    assert!(handle.is_complete());

    let mut cx = Context::from_waker(Waker::noop());
    assert_eq!(Pin::new(&mut handle).poll(&mut cx), Poll::Ready(4096));

    assert_eq!(reader.finish_read(), Some(4096));
    assert_eq!(reader.finish_read(), None);
    assert_eq!(&buf[..], &data[9 * 2048..11 * 2048]);

    reader.cancel_read();
    assert_eq!(reader.finish_read(), None);
}

#[test]
fn any_reader_detects_formats() {
    let dir = tempfile::tempdir().unwrap();
    let data = image_bytes(2048 * 12);

    let hnk = pack(dir.path(), "disc.hnk", &data, Codec::Zstd);
    let iso = dir.path().join("disc.iso");
    std::fs::write(&iso, &data).unwrap();
    let unknown = dir.path().join("notes.txt");
    std::fs::write(&unknown, b"hello").unwrap();

    assert_eq!(ImageFormat::detect(&hnk), Some(ImageFormat::Hnk));
    assert_eq!(ImageFormat::detect(&iso), Some(ImageFormat::Flat));
    assert_eq!(ImageFormat::detect(&unknown), None);

    let config = BlockConfig {
        block_size: 2048,
        data_offset: 0,
    };
    for path in [&hnk, &iso] {
        let mut reader = AnyReader::open_with(path, config).unwrap();
        assert_eq!(reader.block_count(), 12);
        assert_eq!(reader.logical_size(), Some(data.len() as u64));

        let mut buf = vec![0u8; 2048 * 3];
        assert_eq!(reader.read_sync(&mut buf, 5, 3), 2048 * 3);
        assert_eq!(&buf[..], &data[5 * 2048..8 * 2048]);
    }

    assert!(matches!(
        AnyReader::open(&unknown),
        Err(Error::UnknownFormat(_))
    ));
}
