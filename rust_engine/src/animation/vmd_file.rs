//! VMD 文件读写
//!
//! 文件布局（小端）：
//!   版本头 (30B) | 模型名 (10B / 20B) |
//!   骨骼帧数 (u32) + 骨骼记录 (111B/帧) |
//!   表情帧数 (u32) + 表情记录 (23B/帧) |
//!   相机帧数 (u32) + 相机记录 (61B/帧) |
//!   光照帧数 (u32) + 光照记录 (28B/帧)
//!
//! 关键帧按登录顺序存储，读取后按帧号排序。

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3};

use crate::config::MotionConstants;
use crate::{MmdError, Result};
use super::keyframe::{BoneKeyframe, CameraKeyframe, CurveParam};
use super::track::{BoneTrack, CameraTrack, TrackChannels};

/// 版本头长度
const VERSION_LEN: usize = 30;
/// 骨骼名长度
const BONE_NAME_LEN: usize = 15;
/// 骨骼记录中名称之后的二进制部分：帧号 + 位置 + 四元数 + 插值
const BONE_BIN_LEN: u64 = 4 + 3 * 4 + 4 * 4 + 64;
/// 表情记录长度
const MORPH_LEN: u64 = 15 + 4 + 4;
/// 相机记录长度
const CAMERA_LEN: u64 = 4 + 4 + 3 * 4 + 3 * 4 + 24 + 4 + 1;

/// FOV 的存储方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FovEncoding {
    /// 原始 f32
    Float,
    /// 四舍五入后的 u32
    RoundedInt,
}

/// 各版本的字段宽度与编码规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLayout {
    pub header: &'static str,
    pub model_name_len: usize,
    pub fov_encoding: FovEncoding,
    /// 相机曲线参数每组 4 字节在磁盘上的排列：`disk[k] = memory[order[k]]`
    pub camera_curve_order: [usize; 4],
}

const LEGACY_LAYOUT: FormatLayout = FormatLayout {
    header: "Vocaloid Motion Data file",
    model_name_len: 10,
    fov_encoding: FovEncoding::Float,
    camera_curve_order: [0, 1, 2, 3],
};

const CURRENT_LAYOUT: FormatLayout = FormatLayout {
    header: "Vocaloid Motion Data 0002",
    model_name_len: 20,
    fov_encoding: FovEncoding::RoundedInt,
    camera_curve_order: [0, 2, 1, 3],
};

/// VMD 格式版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmdVersion {
    Legacy,
    Current,
}

impl VmdVersion {
    pub fn layout(self) -> &'static FormatLayout {
        match self {
            VmdVersion::Legacy => &LEGACY_LAYOUT,
            VmdVersion::Current => &CURRENT_LAYOUT,
        }
    }

    /// 由解码后的版本头识别版本，未知版本头是致命错误
    pub fn from_header(header: &str) -> Result<Self> {
        [VmdVersion::Legacy, VmdVersion::Current]
            .into_iter()
            .find(|v| v.layout().header == header)
            .ok_or_else(|| MmdError::UnknownVersion(header.to_string()))
    }
}

/// 读取错误：数据不足视为文件被截断
fn field_error(e: io::Error, field: &str) -> MmdError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        MmdError::Truncated(field.to_string())
    } else {
        MmdError::Io(e)
    }
}

/// VMD 读取器
///
/// 构造时读取版本头和模型名，之后各数据块按需定位读取。
pub struct VmdReader<R> {
    reader: R,
    version: VmdVersion,
    model_name: String,
    data_len: u64,
}

/// 数据块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Bone,
    Morph,
    Camera,
}

impl<R: Read + Seek> VmdReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let data_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let mut header = [0u8; VERSION_LEN];
        reader.read_exact(&mut header)
            .map_err(|e| field_error(e, "version header"))?;
        let version = VmdVersion::from_header(&decode_shift_jis(&header))?;

        let mut name_bytes = vec![0u8; version.layout().model_name_len];
        reader.read_exact(&mut name_bytes)
            .map_err(|e| field_error(e, "model name"))?;
        let model_name = decode_shift_jis(&name_bytes);

        Ok(Self {
            reader,
            version,
            model_name,
            data_len,
        })
    }

    pub fn version(&self) -> VmdVersion {
        self.version
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 模型名以相机头开头即为相机文件
    pub fn is_camera(&self) -> bool {
        self.model_name.starts_with(MotionConstants::STANDARD.camera_header_name)
    }

    fn header_len(&self) -> u64 {
        (VERSION_LEN + self.version.layout().model_name_len) as u64
    }

    fn read_count(&mut self, what: &str) -> Result<u32> {
        self.reader.read_u32::<LittleEndian>()
            .map_err(|e| field_error(e, what))
    }

    /// 跳过若干字节，越过数据末尾视为截断
    fn skip(&mut self, bytes: u64, what: &str) -> Result<()> {
        let pos = self.reader.stream_position()?;
        if pos + bytes > self.data_len {
            return Err(MmdError::Truncated(what.to_string()));
        }
        self.reader.seek(SeekFrom::Current(bytes as i64))?;
        Ok(())
    }

    /// 定位到数据块的帧数字段
    fn seek_block(&mut self, block: Block) -> Result<()> {
        let start = self.header_len();
        self.reader.seek(SeekFrom::Start(start))?;
        if block == Block::Bone {
            return Ok(());
        }
        let bone_count = self.read_count("bone keyframe count")?;
        self.skip(u64::from(bone_count) * (BONE_NAME_LEN as u64 + BONE_BIN_LEN), "bone keyframes")?;
        if block == Block::Morph {
            return Ok(());
        }
        let morph_count = self.read_count("morph keyframe count")?;
        self.skip(u64::from(morph_count) * MORPH_LEN, "morph keyframes")?;
        Ok(())
    }

    /// 列出骨骼名及其关键帧数（按首次出现顺序）
    pub fn list_bone_names(&mut self) -> Result<Vec<(String, usize)>> {
        self.seek_block(Block::Bone)?;
        let count = self.read_count("bone keyframe count")?;
        let mut names: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for _ in 0..count {
            let name = self.read_bone_name()?;
            match index.get(&name) {
                Some(&i) => names[i].1 += 1,
                None => {
                    index.insert(name.clone(), names.len());
                    names.push((name, 1));
                }
            }
            self.skip(BONE_BIN_LEN, "bone keyframe")?;
        }
        Ok(names)
    }

    /// 读取指定名称的骨骼轨道
    ///
    /// 只解码所需骨骼，其余记录直接跳过。文件中不存在的骨骼得到空轨道。
    pub fn read_bone_tracks<I, S>(&mut self, names: I) -> Result<HashMap<String, BoneTrack>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tracks: HashMap<String, BoneTrack> = names
            .into_iter()
            .map(|n| (n.as_ref().to_string(), BoneTrack::new(n.as_ref())))
            .collect();

        self.seek_block(Block::Bone)?;
        let count = self.read_count("bone keyframe count")?;
        let mut decoded = 0usize;
        for _ in 0..count {
            let name = self.read_bone_name()?;
            match tracks.get_mut(&name) {
                Some(track) => {
                    track.push(read_bone_keyframe(&mut self.reader)?);
                    decoded += 1;
                }
                None => self.skip(BONE_BIN_LEN, "bone keyframe")?,
            }
        }

        for track in tracks.values_mut() {
            track.sort_by_frame();
            if track.is_empty() {
                log::debug!("骨骼 {} 在文件中没有关键帧", track.name);
            }
        }
        log::debug!("骨骼块共 {} 帧，解码 {} 帧", count, decoded);
        Ok(tracks)
    }

    /// 读取相机轨道
    pub fn read_camera(&mut self) -> Result<CameraTrack> {
        self.seek_block(Block::Camera)?;
        let count = self.read_count("camera keyframe count")?;
        let layout = self.version.layout();
        let mut track = CameraTrack::new();
        for _ in 0..count {
            track.push(read_camera_keyframe(&mut self.reader, layout)?);
        }
        track.sort_by_frame();
        Ok(track)
    }

    fn read_bone_name(&mut self) -> Result<String> {
        let mut name_bytes = [0u8; BONE_NAME_LEN];
        self.reader.read_exact(&mut name_bytes)
            .map_err(|e| field_error(e, "bone name"))?;
        Ok(decode_shift_jis(&name_bytes))
    }
}

/// 读取骨骼关键帧（名称之后的部分）
fn read_bone_keyframe<R: Read>(reader: &mut R) -> Result<BoneKeyframe> {
    let frame_id = reader.read_u32::<LittleEndian>()
        .map_err(|e| field_error(e, "bone frame index"))?;

    let mut floats = [0f32; 7];
    reader.read_f32_into::<LittleEndian>(&mut floats)
        .map_err(|e| field_error(e, "bone transform"))?;

    // 插值参数 (64 字节)：4 组各 16 字节，每组步长 4 取 4 个值
    let mut interpolation = [0u8; 64];
    reader.read_exact(&mut interpolation)
        .map_err(|e| field_error(e, "bone interpolation"))?;
    let group = |g: usize| {
        let base = g * 16;
        CurveParam::from_bytes([
            interpolation[base],
            interpolation[base + 4],
            interpolation[base + 8],
            interpolation[base + 12],
        ])
    };

    Ok(BoneKeyframe {
        frame_id,
        position: Vec3::new(floats[0], floats[1], floats[2]),
        orientation: Quat::from_xyzw(floats[3], floats[4], floats[5], floats[6]),
        curve_x: group(0),
        curve_y: group(1),
        curve_z: group(2),
        curve_rot: group(3),
    })
}

/// 读取相机关键帧
/// VMD 相机数据: 61 字节/帧
///   frame_index (u32, 4B)
///   distance (f32, 4B)
///   position (Vec3, 12B)
///   angle (Vec3, 12B) — 欧拉角，弧度
///   interpolation (24B) — 6组4字节贝塞尔参数 (x, y, z, 旋转, 距离, FOV)
///   fov (u32 或 f32, 4B)
///   perspective (u8, 1B)
fn read_camera_keyframe<R: Read>(reader: &mut R, layout: &FormatLayout) -> Result<CameraKeyframe> {
    let frame_id = reader.read_u32::<LittleEndian>()
        .map_err(|e| field_error(e, "camera frame index"))?;

    let distance = reader.read_f32::<LittleEndian>()
        .map_err(|e| field_error(e, "camera distance"))?;

    let mut floats = [0f32; 6];
    reader.read_f32_into::<LittleEndian>(&mut floats)
        .map_err(|e| field_error(e, "camera transform"))?;

    let mut interp_raw = [0u8; 24];
    reader.read_exact(&mut interp_raw)
        .map_err(|e| field_error(e, "camera interpolation"))?;
    let order = layout.camera_curve_order;
    let group = |g: usize| {
        let mut bytes = [0u8; 4];
        for (k, &slot) in order.iter().enumerate() {
            bytes[slot] = interp_raw[g * 4 + k];
        }
        CurveParam::from_bytes(bytes)
    };

    let fov_angle = match layout.fov_encoding {
        FovEncoding::RoundedInt => reader.read_u32::<LittleEndian>()
            .map_err(|e| field_error(e, "camera fov"))? as f32,
        FovEncoding::Float => reader.read_f32::<LittleEndian>()
            .map_err(|e| field_error(e, "camera fov"))?,
    };

    let perspective_flag = reader.read_u8()
        .map_err(|e| field_error(e, "camera perspective flag"))? != 0;

    Ok(CameraKeyframe {
        frame_id,
        distance,
        position: Vec3::new(floats[0], floats[1], floats[2]),
        orientation: Vec3::new(floats[3], floats[4], floats[5]),
        curve_x: group(0),
        curve_y: group(1),
        curve_z: group(2),
        curve_rot: group(3),
        curve_dis: group(4),
        curve_fov: group(5),
        fov_angle,
        perspective_flag,
    })
}

/// 写入版本头和模型名（总是使用当前版本）
fn write_header<W: Write>(writer: &mut W, model_name: &str) -> Result<()> {
    let layout = VmdVersion::Current.layout();
    writer.write_all(&encode_shift_jis(layout.header, VERSION_LEN)?)?;
    writer.write_all(&encode_shift_jis(model_name, layout.model_name_len)?)?;
    Ok(())
}

/// 骨骼插值参数的 64 字节布局
///
/// 第 0 行交错存放四组参数 `[X0,Y0,Z0,R0, X1,Y1,Z1,R1, ...]`，
/// 第 r 行为第 0 行左移 r 字节。这样按行交错读取和按组步长读取得到相同结果。
fn bone_interpolation_bytes(curves: [CurveParam; 4]) -> [u8; 64] {
    let mut row0 = [0u8; 16];
    for (g, curve) in curves.iter().enumerate() {
        for (k, b) in curve.to_bytes().into_iter().enumerate() {
            row0[4 * k + g] = b;
        }
    }
    let mut out = [0u8; 64];
    for r in 0..4 {
        for c in 0..16 - r {
            out[r * 16 + c] = row0[c + r];
        }
    }
    out
}

fn write_bone_keyframe<W: Write>(writer: &mut W, name_raw: &[u8], kf: &BoneKeyframe) -> Result<()> {
    writer.write_all(name_raw)?;
    writer.write_u32::<LittleEndian>(kf.frame_id)?;
    for v in kf.position.to_array() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    for v in kf.orientation.to_array() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    let curves = [kf.curve_x, kf.curve_y, kf.curve_z, kf.curve_rot];
    writer.write_all(&bone_interpolation_bytes(curves))?;
    Ok(())
}

fn write_camera_keyframe<W: Write>(writer: &mut W, kf: &CameraKeyframe) -> Result<()> {
    let layout = VmdVersion::Current.layout();
    writer.write_u32::<LittleEndian>(kf.frame_id)?;
    writer.write_f32::<LittleEndian>(kf.distance)?;
    for v in kf.position.to_array() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    for v in kf.orientation.to_array() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    let curves = [kf.curve_x, kf.curve_y, kf.curve_z, kf.curve_rot, kf.curve_dis, kf.curve_fov];
    for curve in curves {
        let bytes = curve.to_bytes();
        for &slot in &layout.camera_curve_order {
            writer.write_u8(bytes[slot])?;
        }
    }
    writer.write_u32::<LittleEndian>(kf.fov_angle.round().max(0.0) as u32)?;
    writer.write_u8(u8::from(kf.perspective_flag))?;
    Ok(())
}

/// 写入骨骼轨道（按骨骼名排序，轨道内按帧号顺序），表情/相机/光照块为空
pub fn write_bone_tracks_to<W: Write>(
    writer: &mut W,
    model_name: &str,
    tracks: &HashMap<String, BoneTrack>,
) -> Result<()> {
    write_header(writer, model_name)?;

    let mut names: Vec<&String> = tracks.keys().collect();
    names.sort();

    let total: usize = tracks.values().map(|t| t.len()).sum();
    writer.write_u32::<LittleEndian>(total as u32)?;
    for name in names {
        let track = &tracks[name];
        let name_raw = encode_shift_jis(name, BONE_NAME_LEN)?;
        for i in 0..track.len() {
            write_bone_keyframe(writer, &name_raw, &track.keyframe(i))?;
        }
    }

    // 表情、相机、光照
    for _ in 0..3 {
        writer.write_u32::<LittleEndian>(0)?;
    }
    Ok(())
}

/// 写入相机轨道，骨骼/表情/光照块为空
pub fn write_camera_to<W: Write>(writer: &mut W, track: &CameraTrack) -> Result<()> {
    write_header(writer, MotionConstants::STANDARD.camera_header_name)?;
    // 骨骼、表情
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u32::<LittleEndian>(0)?;

    writer.write_u32::<LittleEndian>(track.len() as u32)?;
    for i in 0..track.len() {
        write_camera_keyframe(writer, &track.keyframe(i))?;
    }

    // 光照
    writer.write_u32::<LittleEndian>(0)?;
    Ok(())
}

fn open<P: AsRef<Path>>(path: P) -> Result<VmdReader<BufReader<File>>> {
    let file = File::open(path.as_ref()).map_err(MmdError::Io)?;
    VmdReader::new(BufReader::new(file))
}

/// 读取模型名（相机文件为相机头）
pub fn read_track_name<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(open(path)?.model_name().to_string())
}

/// 是否为相机文件
pub fn is_camera_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    Ok(open(path)?.is_camera())
}

/// 列出骨骼名及关键帧数
pub fn list_bone_names<P: AsRef<Path>>(path: P) -> Result<Vec<(String, usize)>> {
    open(path)?.list_bone_names()
}

/// 读取指定骨骼的轨道
pub fn read_bone_tracks<P, I, S>(path: P, names: I) -> Result<HashMap<String, BoneTrack>>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    open(path)?.read_bone_tracks(names)
}

/// 读取相机轨道
pub fn read_camera<P: AsRef<Path>>(path: P) -> Result<CameraTrack> {
    open(path)?.read_camera()
}

/// 写入骨骼 VMD 文件
///
/// 先在内存中完成编码，编码失败时不会产生输出文件。
pub fn write_bone_tracks<P: AsRef<Path>>(
    path: P,
    model_name: &str,
    tracks: &HashMap<String, BoneTrack>,
) -> Result<()> {
    let mut buffer = Vec::new();
    write_bone_tracks_to(&mut buffer, model_name, tracks)?;
    fs::write(path, buffer)?;
    Ok(())
}

/// 写入相机 VMD 文件
pub fn write_camera<P: AsRef<Path>>(path: P, track: &CameraTrack) -> Result<()> {
    let mut buffer = Vec::new();
    write_camera_to(&mut buffer, track)?;
    fs::write(path, buffer)?;
    Ok(())
}

/// 解码 Shift-JIS 字符串
fn decode_shift_jis(bytes: &[u8]) -> String {
    // 找到第一个 null 字节
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes[..end]);
    decoded.into_owned()
}

/// 编码为定长 Shift-JIS 字段（null 填充，过长时截断）
fn encode_shift_jis(text: &str, len: usize) -> Result<Vec<u8>> {
    let (encoded, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
    if had_errors {
        return Err(MmdError::Encoding(format!("{:?} 无法用 Shift-JIS 表示", text)));
    }
    let mut raw = encoded.into_owned();
    if raw.len() > len {
        log::warn!("名称 {:?} 超过 {} 字节，已截断", text, len);
        raw.truncate(len);
    }
    raw.resize(len, 0);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_bone_tracks() -> HashMap<String, BoneTrack> {
        let center = BoneTrack::from_keyframes(
            "センター",
            vec![
                BoneKeyframe {
                    curve_x: CurveParam::new(10, 20, 30, 40),
                    curve_rot: CurveParam::new(127, 0, 0, 127),
                    ..BoneKeyframe::with_pose(
                        15,
                        Vec3::new(1.5, -2.25, 3.125),
                        Quat::from_rotation_y(0.7),
                    )
                },
                BoneKeyframe::with_pose(0, Vec3::ZERO, Quat::IDENTITY),
            ],
        );
        let head = BoneTrack::from_keyframes(
            "頭",
            vec![BoneKeyframe {
                curve_y: CurveParam::new(1, 2, 3, 4),
                curve_z: CurveParam::new(5, 6, 7, 8),
                ..BoneKeyframe::with_pose(
                    7,
                    Vec3::new(0.0, 17.2, -0.12),
                    Quat::from_rotation_x(-0.2),
                )
            }],
        );
        HashMap::from([(center.name.clone(), center), (head.name.clone(), head)])
    }

    fn sample_camera() -> CameraTrack {
        CameraTrack::from_keyframes(vec![
            CameraKeyframe {
                distance: -45.0,
                position: Vec3::new(0.0, 10.0, 0.0),
                orientation: Vec3::new(0.1, 0.2, 0.3),
                curve_x: CurveParam::new(1, 2, 3, 4),
                curve_fov: CurveParam::new(9, 8, 7, 6),
                fov_angle: 30.0,
                ..CameraKeyframe::new(30)
            },
            CameraKeyframe {
                fov_angle: 45.0,
                perspective_flag: false,
                ..CameraKeyframe::new(0)
            },
        ])
    }

    #[test]
    fn test_bone_roundtrip() {
        let tracks = sample_bone_tracks();
        let mut buffer = Vec::new();
        write_bone_tracks_to(&mut buffer, "テストモデル", &tracks).unwrap();

        let mut reader = VmdReader::new(Cursor::new(buffer)).unwrap();
        assert_eq!(reader.version(), VmdVersion::Current);
        assert_eq!(reader.model_name(), "テストモデル");
        assert!(!reader.is_camera());

        let read = reader.read_bone_tracks(["センター", "頭"]).unwrap();
        assert_eq!(read["センター"], tracks["センター"]);
        assert_eq!(read["頭"], tracks["頭"]);
    }

    #[test]
    fn test_missing_bone_is_empty_track() {
        let mut buffer = Vec::new();
        write_bone_tracks_to(&mut buffer, "model", &sample_bone_tracks()).unwrap();
        let mut reader = VmdReader::new(Cursor::new(buffer)).unwrap();
        let read = reader.read_bone_tracks(["左腕"]).unwrap();
        assert!(read["左腕"].is_empty());
        assert_eq!(read.len(), 1);
    }

    #[test]
    fn test_list_bone_names() {
        let mut buffer = Vec::new();
        write_bone_tracks_to(&mut buffer, "model", &sample_bone_tracks()).unwrap();
        let mut reader = VmdReader::new(Cursor::new(buffer)).unwrap();
        let names = reader.list_bone_names().unwrap();
        assert!(names.contains(&("センター".to_string(), 2)));
        assert!(names.contains(&("頭".to_string(), 1)));
    }

    #[test]
    fn test_camera_roundtrip() {
        let camera = sample_camera();
        let mut buffer = Vec::new();
        write_camera_to(&mut buffer, &camera).unwrap();

        let mut reader = VmdReader::new(Cursor::new(buffer)).unwrap();
        assert!(reader.is_camera());
        let read = reader.read_camera().unwrap();
        assert_eq!(read, camera);
        assert_eq!(read.frame_ids, vec![0, 30]);
    }

    #[test]
    fn test_camera_curve_permutation_on_disk() {
        let camera = CameraTrack::from_keyframes(vec![CameraKeyframe {
            curve_x: CurveParam::new(1, 2, 3, 4),
            ..CameraKeyframe::new(0)
        }]);
        let mut buffer = Vec::new();
        write_camera_to(&mut buffer, &camera).unwrap();
        // 版本头 30 + 模型名 20 + 三个计数 12，再跳过帧号/距离/位置/角度 32
        let offset = 30 + 20 + 4 * 3 + 32;
        assert_eq!(&buffer[offset..offset + 4], &[1, 3, 2, 4]);
    }

    #[test]
    fn test_bone_interpolation_layout() {
        let bytes = bone_interpolation_bytes([
            CurveParam::new(1, 2, 3, 4),
            CurveParam::new(5, 6, 7, 8),
            CurveParam::new(9, 10, 11, 12),
            CurveParam::new(13, 14, 15, 16),
        ]);
        // 第 0 行交错排列
        assert_eq!(&bytes[0..8], &[1, 5, 9, 13, 2, 6, 10, 14]);
        // 按组步长读取
        assert_eq!([bytes[16], bytes[20], bytes[24], bytes[28]], [5, 6, 7, 8]);
        assert_eq!([bytes[48], bytes[52], bytes[56], bytes[60]], [13, 14, 15, 16]);
    }

    #[test]
    fn test_legacy_camera_read() {
        let mut data = Vec::new();
        data.extend(encode_shift_jis("Vocaloid Motion Data file", 30).unwrap());
        data.extend(encode_shift_jis("camera", 10).unwrap());
        data.write_u32::<LittleEndian>(0).unwrap();
        data.write_u32::<LittleEndian>(0).unwrap();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(12).unwrap();
        data.write_f32::<LittleEndian>(-30.0).unwrap();
        for _ in 0..6 {
            data.write_f32::<LittleEndian>(0.5).unwrap();
        }
        // 旧版本曲线不做置换
        for g in 0..6u8 {
            data.extend([g, g + 10, g + 20, g + 30]);
        }
        data.write_f32::<LittleEndian>(27.5).unwrap();
        data.write_u8(1).unwrap();
        data.write_u32::<LittleEndian>(0).unwrap();

        let mut reader = VmdReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.version(), VmdVersion::Legacy);
        assert_eq!(reader.model_name(), "camera");
        let camera = reader.read_camera().unwrap();
        assert_eq!(camera.frame_ids, vec![12]);
        assert_eq!(camera.fov_angles, vec![27.5]);
        assert_eq!(camera.curve_y[0], CurveParam::new(1, 11, 21, 31));
        assert!(camera.perspective_flags[0]);
    }

    #[test]
    fn test_unknown_version_is_fatal() {
        let mut data = encode_shift_jis("Not a motion file", 30).unwrap();
        data.extend([0u8; 40]);
        match VmdReader::new(Cursor::new(data)) {
            Err(MmdError::UnknownVersion(header)) => assert_eq!(header, "Not a motion file"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.model_name().to_string())),
        }
    }

    #[test]
    fn test_truncated_file() {
        let mut buffer = Vec::new();
        write_bone_tracks_to(&mut buffer, "model", &sample_bone_tracks()).unwrap();
        buffer.truncate(30 + 20 + 4 + 50);
        let mut reader = VmdReader::new(Cursor::new(buffer)).unwrap();
        assert!(matches!(
            reader.read_bone_tracks(["センター", "頭"]),
            Err(MmdError::Truncated(_))
        ));
    }

    #[test]
    fn test_truncated_while_skipping() {
        let mut buffer = Vec::new();
        write_bone_tracks_to(&mut buffer, "model", &sample_bone_tracks()).unwrap();
        buffer.truncate(30 + 20 + 4 + 15 + 10);
        let mut reader = VmdReader::new(Cursor::new(buffer)).unwrap();
        assert!(matches!(reader.read_bone_tracks(["右腕"]), Err(MmdError::Truncated(_))));
    }

    #[test]
    fn test_path_roundtrip() {
        let file_name = format!("vmd_interp_engine_{}.vmd", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        let camera = sample_camera();
        write_camera(&path, &camera).unwrap();
        assert!(is_camera_file(&path).unwrap());
        assert_eq!(read_track_name(&path).unwrap(), "カメラ・照明");
        assert_eq!(read_camera(&path).unwrap(), camera);
        assert!(read_bone_tracks(&path, ["センター"]).unwrap()["センター"].is_empty());
        let _ = fs::remove_file(&path);
    }
}
