// Licensed under the Apache-2.0 license

//! End-to-end command flows on real files.

use std::fs;
use std::path::PathBuf;

use eeprom_config::{codec, image};
use eeprom_image::{EepromImage, FILENAME_LEN, FILE_HDR_LEN, FILE_MAGIC, MAX_FILE_SIZE};
use p384::pkcs8::{EncodePublicKey, LineEnding};
use p384::SecretKey;
use tempfile::{tempdir, TempDir};

const IMAGE_SIZE: usize = 512 * 1024;

fn put_file(data: &mut [u8], offset: usize, name: &str, payload: &[u8]) -> usize {
    let length = (FILENAME_LEN + 4 + payload.len()) as u32;
    data[offset..offset + 4].copy_from_slice(&FILE_MAGIC.to_be_bytes());
    data[offset + 4..offset + 8].copy_from_slice(&length.to_be_bytes());
    data[offset + 8..offset + 20].fill(0);
    data[offset + 8..offset + 8 + name.len()].copy_from_slice(name.as_bytes());
    let body = offset + 4 + FILE_HDR_LEN;
    data[body..body + payload.len()].copy_from_slice(payload);
    (offset + 8 + length as usize + 7) & !7
}

/// A key slot followed by the boot configuration file, then erased
/// flash. The bootconf sits last so updates can grow it into the free
/// tail of the image.
fn sample_image() -> Vec<u8> {
    let mut data = vec![0xff; IMAGE_SIZE];
    let offset = put_file(&mut data, 0, "pubkey.bin", &[0xab; 96]);
    put_file(&mut data, offset, "bootconf.txt", b"BOOT_UART=1\n");
    data
}

/// Image on disk in a fresh temp directory.
fn deployed_image() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pieeprom.bin");
    fs::write(&path, sample_image()).unwrap();
    (dir, path)
}

/// PEM of the public key for scalar 1, i.e. the curve's base point.
fn base_point_pem() -> String {
    let mut scalar = [0u8; 48];
    scalar[47] = 1;
    let secret = SecretKey::from_slice(&scalar).unwrap();
    secret
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

#[test]
fn test_update_file_rewrites_image_in_place() {
    let (dir, image_path) = deployed_image();
    let src = dir.path().join("newconf.txt");
    fs::write(&src, b"BOOT_ORDER=0xf41\n").unwrap();

    image::update_file(&image_path, "bootconf.txt", &src, None).unwrap();

    let updated = EepromImage::from_file(&image_path).unwrap();
    assert_eq!(updated.bootconf().unwrap(), b"BOOT_ORDER=0xf41\n");
}

#[test]
fn test_update_file_to_separate_output_keeps_input() {
    let (dir, image_path) = deployed_image();
    let src = dir.path().join("newconf.txt");
    fs::write(&src, b"BOOT_ORDER=0xf41\n").unwrap();
    let out = dir.path().join("pieeprom.new");

    image::update_file(&image_path, "bootconf.txt", &src, Some(&out)).unwrap();

    assert_eq!(fs::read(&image_path).unwrap(), sample_image());
    let updated = EepromImage::from_file(&out).unwrap();
    assert_eq!(updated.bootconf().unwrap(), b"BOOT_ORDER=0xf41\n");
}

#[test]
fn test_update_file_rejects_oversized_payload() {
    let (dir, image_path) = deployed_image();
    let src = dir.path().join("big.bin");
    fs::write(&src, vec![0u8; MAX_FILE_SIZE + 1]).unwrap();

    let err = image::update_file(&image_path, "bootconf.txt", &src, None).unwrap_err();

    assert!(err.to_string().contains("4076"), "{}", err);
    assert_eq!(fs::read(&image_path).unwrap(), sample_image());
}

#[test]
fn test_update_file_missing_section_writes_nothing() {
    let (dir, image_path) = deployed_image();
    let src = dir.path().join("newconf.txt");
    fs::write(&src, b"x").unwrap();

    let err = image::update_file(&image_path, "missing.bin", &src, None).unwrap_err();

    assert!(err.to_string().contains("missing.bin"), "{}", err);
    assert_eq!(fs::read(&image_path).unwrap(), sample_image());
}

#[test]
fn test_update_file_rejects_payload_overflowing_its_slot() {
    // bootconf.txt holds 12 bytes with the key section starting at 40.
    // 17 new bytes fit the slot's raw 40, but the aligned footprint
    // reaches 48 and would clobber the neighbor's header.
    let dir = tempdir().unwrap();
    let mut data = vec![0xff; IMAGE_SIZE];
    let offset = put_file(&mut data, 0, "bootconf.txt", b"BOOT_UART=1\n");
    put_file(&mut data, offset, "pubkey.bin", &[0xab; 96]);
    let image_path = dir.path().join("pieeprom.bin");
    fs::write(&image_path, &data).unwrap();
    let src = dir.path().join("newconf.txt");
    fs::write(&src, b"BOOT_ORDER=0xf41\n").unwrap();

    let err = image::update_file(&image_path, "bootconf.txt", &src, None).unwrap_err();

    assert!(err.to_string().contains("only has 40"), "{}", err);
    assert_eq!(fs::read(&image_path).unwrap(), data);
}

#[test]
fn test_update_key_stores_raw_point() {
    let (dir, image_path) = deployed_image();
    let pem_path = dir.path().join("key.pem");
    fs::write(&pem_path, base_point_pem()).unwrap();

    image::update_key(&image_path, "pubkey.bin", &pem_path, None).unwrap();

    let updated = EepromImage::from_file(&image_path).unwrap();
    let payload = updated.payload("pubkey.bin").unwrap();
    assert_eq!(payload.len(), 96);
    assert_eq!(payload[..4], [0xaa, 0x87, 0xca, 0x22]);
}

#[test]
fn test_update_key_rejects_bad_pem() {
    let (dir, image_path) = deployed_image();
    let pem_path = dir.path().join("key.pem");
    fs::write(&pem_path, "-----BEGIN GARBAGE-----\n").unwrap();

    let err = image::update_key(&image_path, "pubkey.bin", &pem_path, None).unwrap_err();

    assert!(err.to_string().contains("key.pem"), "{}", err);
    assert_eq!(fs::read(&image_path).unwrap(), sample_image());
}

#[test]
fn test_extract_all_creates_the_directory() {
    let (dir, image_path) = deployed_image();
    let out_dir = dir.path().join("sections");

    image::extract_all(&image_path, &out_dir).unwrap();

    assert_eq!(
        fs::read(out_dir.join("bootconf.txt")).unwrap(),
        b"BOOT_UART=1\n"
    );
    assert_eq!(fs::read(out_dir.join("pubkey.bin")).unwrap(), vec![0xab; 96]);
}

#[test]
fn test_write_copies_the_image() {
    let (dir, image_path) = deployed_image();
    let out = dir.path().join("copy.bin");

    image::write(&image_path, out.to_str().unwrap()).unwrap();

    assert_eq!(fs::read(&out).unwrap(), sample_image());
}

#[test]
fn test_list_rejects_corrupt_image() {
    let (dir, _) = deployed_image();
    let mut bad = sample_image();
    bad[..4].copy_from_slice(&0x1234_5678u32.to_be_bytes());
    let bad_path = dir.path().join("bad.bin");
    fs::write(&bad_path, &bad).unwrap();

    let err = image::list(&bad_path).unwrap_err();

    assert!(err.to_string().contains("bad magic"), "{}", err);
}

#[test]
fn test_list_and_read_bootconf_accept_a_stock_image() {
    let (_dir, image_path) = deployed_image();
    image::list(&image_path).unwrap();
    image::read_bootconf(&image_path).unwrap();
}

#[test]
fn test_codec_file_round_trip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("boot.bin");
    let data = b"the quick brown fox jumps over the lazy dog. ".repeat(40);
    fs::write(&input, &data).unwrap();
    let packed = dir.path().join("boot.lz");
    let plain = dir.path().join("boot.out");

    codec::compress(&input, Some(&packed)).unwrap();
    codec::decompress(&packed, Some(&plain)).unwrap();

    assert!(fs::metadata(&packed).unwrap().len() < data.len() as u64);
    assert_eq!(fs::read(&plain).unwrap(), data);
}

#[test]
fn test_decompress_rejects_truncated_stream() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.lz");
    // A back-reference item with its count byte missing.
    fs::write(&input, [0x01u8, 0x07]).unwrap();

    let err = codec::decompress(&input, None).unwrap_err();

    assert!(err.to_string().contains("unexpected end"), "{}", err);
}
