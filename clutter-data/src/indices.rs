// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use npyz::{DType, NpyFile, TypeChar, WriterBuilder};

use clutter_core::error::ClutterError;

/// Read a 1-D integer numpy array of image indices
///
/// Signed and unsigned integer arrays of any width are accepted. Negative
/// indices are rejected.
///
/// # Arguments
///
/// * `path` - Path to a `.npy` file
///
/// ```no_run
/// use clutter_data::indices::read_indices;
/// let indices = read_indices("train_indices.npy").unwrap();
/// ```
pub fn read_indices<P: AsRef<Path>>(path: P) -> Result<Vec<u64>, ClutterError> {
    let path = path.as_ref();
    let message = path.display().to_string();

    let bytes = std::fs::read(path).map_err(|_| ClutterError::NoFileError(message.clone()))?;
    let npy = NpyFile::new(&bytes[..])
        .map_err(|err| ClutterError::DatasetError(format!("{}: {}", message, err)))?;

    let invalid =
        |err: std::io::Error| ClutterError::DatasetError(format!("{}: {}", message, err));

    let signed: Vec<i64> = match npy.dtype() {
        DType::Plain(x) => match (x.type_char(), x.size_field()) {
            (TypeChar::Int, 1) => widen(npy.into_vec::<i8>().map_err(invalid)?),
            (TypeChar::Int, 2) => widen(npy.into_vec::<i16>().map_err(invalid)?),
            (TypeChar::Int, 4) => widen(npy.into_vec::<i32>().map_err(invalid)?),
            (TypeChar::Int, 8) => npy.into_vec::<i64>().map_err(invalid)?,
            (TypeChar::Uint, 1) => return Ok(widen(npy.into_vec::<u8>().map_err(invalid)?)),
            (TypeChar::Uint, 2) => return Ok(widen(npy.into_vec::<u16>().map_err(invalid)?)),
            (TypeChar::Uint, 4) => return Ok(widen(npy.into_vec::<u32>().map_err(invalid)?)),
            (TypeChar::Uint, 8) => return npy.into_vec::<u64>().map_err(invalid),
            _ => {
                return Err(ClutterError::DatasetError(format!(
                    "{}: index arrays must hold integers",
                    message
                )));
            }
        },
        _ => {
            return Err(ClutterError::DatasetError(format!(
                "{}: structured index arrays are not supported",
                message
            )));
        }
    };

    signed
        .into_iter()
        .map(|i| {
            u64::try_from(i).map_err(|_| {
                ClutterError::DatasetError(format!("{}: negative index {}", message, i))
            })
        })
        .collect()
}

fn widen<T, U: From<T>>(values: Vec<T>) -> Vec<U> {
    values.into_iter().map(U::from).collect()
}

/// Write image indices as a 1-D int64 numpy array
///
/// # Arguments
///
/// * `path` - Path to output `.npy` file
/// * `indices` - Image indices
pub fn write_indices<P: AsRef<Path>>(path: P, indices: &[u64]) -> Result<(), ClutterError> {
    let path = path.as_ref();
    let failed =
        |err: std::io::Error| ClutterError::DatasetError(format!("{}: {}", path.display(), err));

    let mut buffer = vec![];
    let mut writer = npyz::WriteOptions::<i64>::new()
        .default_dtype()
        .shape(&[indices.len() as u64])
        .writer(&mut buffer)
        .begin_nd()
        .map_err(failed)?;

    for &index in indices {
        let index = i64::try_from(index).map_err(|_| {
            ClutterError::DatasetError(format!("index {} does not fit in int64", index))
        })?;
        writer.push(&index).map_err(failed)?;
    }

    writer.finish().map_err(failed)?;
    std::fs::write(path, buffer).map_err(|err| ClutterError::DatasetError(err.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let path = std::env::temp_dir().join("CLUTTER_TEST_INDICES.npy");
        write_indices(&path, &[4, 0, 17]).unwrap();

        assert_eq!(read_indices(&path).unwrap(), vec![4, 0, 17]);

        std::fs::remove_file(&path).unwrap();
    }

    fn write_npy<T: npyz::AutoSerialize>(path: &Path, values: &[T]) {
        let mut buffer = vec![];
        let mut writer = npyz::WriteOptions::<T>::new()
            .default_dtype()
            .shape(&[values.len() as u64])
            .writer(&mut buffer)
            .begin_nd()
            .unwrap();
        for value in values {
            writer.push(value).unwrap();
        }
        writer.finish().unwrap();
        std::fs::write(path, buffer).unwrap();
    }

    #[test]
    fn test_read_narrow_dtypes() {
        let path = std::env::temp_dir().join("CLUTTER_TEST_INDICES_NARROW.npy");

        write_npy(&path, &[3i32, 1, 2]);
        assert_eq!(read_indices(&path).unwrap(), vec![3, 1, 2]);

        write_npy(&path, &[7u16, 0]);
        assert_eq!(read_indices(&path).unwrap(), vec![7, 0]);

        write_npy(&path, &[1i8, -1]);
        assert!(matches!(
            read_indices(&path),
            Err(ClutterError::DatasetError(_))
        ));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_missing() {
        let path = std::env::temp_dir().join("CLUTTER_TEST_INDICES_MISSING.npy");
        assert!(matches!(
            read_indices(&path),
            Err(ClutterError::NoFileError(_))
        ));
    }

    #[test]
    fn test_read_not_numpy() {
        let path = std::env::temp_dir().join("CLUTTER_TEST_INDICES_BAD.npy");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            read_indices(&path),
            Err(ClutterError::DatasetError(_))
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
