//! Plain text dumps of assembled systems for inspection in MATLAB or Octave.
//!
//! Sparse matrices are written as `row col value` triplets with zero-based indices and zero
//! entries omitted. The generated script shifts the indices and rebuilds the matrices with
//! `spconvert`.
use crate::assembly::local::CellContributions;
use crate::dofs::DofHandler;
use crate::nalgebra::{DMatrix, DVector};
use crate::nalgebra_sparse::CsrMatrix;
use crate::system::SaddlePointSystem;
use crate::Real;
use eyre::WrapErr;
use log::info;
use std::fmt::Write as FmtWrite;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

fn create_file(path: &Path) -> eyre::Result<BufWriter<File>> {
    let file = File::create(path).wrap_err_with(|| format!("failed to create file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes the non-zero entries of a sparse matrix as `row col value` lines.
pub fn write_sparse_triplets<T: Real>(matrix: &CsrMatrix<T>, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    let mut writer = create_file(path)?;
    for (row, col, value) in matrix.triplet_iter() {
        if *value != T::zero() {
            writeln!(writer, "{} {} {:.20}", row, col, value)?;
        }
    }
    writer
        .flush()
        .wrap_err_with(|| format!("failed to write matrix to {}", path.display()))
}

/// Writes one entry per line.
pub fn write_vector<T: Real>(vector: &DVector<T>, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    let mut writer = create_file(path)?;
    for value in vector.iter() {
        writeln!(writer, "{:.13}", value)?;
    }
    writer
        .flush()
        .wrap_err_with(|| format!("failed to write vector to {}", path.display()))
}

/// Writes a dense matrix row by row with space separated entries.
pub fn write_dense_matrix<T: Real>(matrix: &DMatrix<T>, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    let mut writer = create_file(path)?;
    for row in matrix.row_iter() {
        let mut line = String::new();
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                line.push(' ');
            }
            write!(line, "{:.10}", value)?;
        }
        writeln!(writer, "{}", line)?;
    }
    writer
        .flush()
        .wrap_err_with(|| format!("failed to write matrix to {}", path.display()))
}

/// Writes the support point of every dof, one `x y` line per dof.
pub fn write_support_points<T: Real>(dofs: &DofHandler<T>, path: impl AsRef<Path>) -> eyre::Result<()> {
    let path = path.as_ref();
    let mut writer = create_file(path)?;
    for dof in 0..dofs.n_dofs() {
        let point = dofs.support_point(dof);
        writeln!(writer, "{} {}", point.x, point.y)?;
    }
    writer
        .flush()
        .wrap_err_with(|| format!("failed to write support points to {}", path.display()))
}

/// Generates a MATLAB script that loads the block triplet files and builds the system matrix `A`
/// and the preconditioner `P`.
///
/// All blocks of `P` except the last diagonal one coincide with those of `A`.
pub fn matlab_script(n_blocks: usize, with_local_matrices: bool) -> String {
    let last = n_blocks.saturating_sub(1);
    let mut script = String::from("%loading data\n");
    for i in 0..n_blocks {
        for j in 0..n_blocks {
            script += &format!("a{i}{j} = load('data_a{i}{j}.dat');\n");
            script += &format!("a{i}{j}(:,1:2) = a{i}{j}(:,1:2) + 1;\n");
            script += &format!("a{i}{j} = spconvert(a{i}{j});\n");
            script += &format!("p{i}{j} = a{i}{j};\n");
        }
    }
    script += &format!("p{last}{last} = load('data_p{last}{last}.dat');\n");
    script += &format!("p{last}{last}(:,1:2) = p{last}{last}(:,1:2) + 1;\n");
    script += &format!("p{last}{last} = spconvert(p{last}{last});\n");
    script += "rhs = load('data_rhs.dat');\n";
    if with_local_matrices {
        script += "load('data_l_m.dat');\nload('data_l_p.dat');\n";
    }

    for (name, prefix) in [("A", 'a'), ("P", 'p')] {
        script += &format!("{name} = [");
        for i in 0..n_blocks {
            for j in 0..n_blocks {
                script += &format!("{prefix}{i}{j} ");
            }
            script += ";\n";
        }
        script += "];\n";
    }
    script
}

/// Dumps all blocks of the system matrix, the last diagonal block of the preconditioner, the
/// right-hand side, the dof support points, the local matrices of the first cell (if available)
/// and a MATLAB script tying them together into `directory`.
pub fn write_matlab_study<T: Real>(
    directory: impl AsRef<Path>,
    system: &SaddlePointSystem<T>,
    dofs: &DofHandler<T>,
    first_cell: Option<&CellContributions<T>>,
    script_name: &str,
) -> eyre::Result<()> {
    let directory = directory.as_ref();
    create_dir_all(directory).wrap_err_with(|| format!("failed to create directory {}", directory.display()))?;

    let n_blocks = system.block_indices().n_blocks();
    for i in 0..n_blocks {
        for j in 0..n_blocks {
            let block = system.system_matrix.block(i, j);
            write_sparse_triplets(&block, directory.join(format!("data_a{i}{j}.dat")))?;
        }
    }
    let last = n_blocks.saturating_sub(1);
    let preconditioner_block = system.system_preconditioner.block(last, last);
    write_sparse_triplets(&preconditioner_block, directory.join(format!("data_p{last}{last}.dat")))?;
    write_vector(system.system_rhs.as_vector(), directory.join("data_rhs.dat"))?;
    write_support_points(dofs, directory.join("nodes.dat"))?;

    if let Some(contributions) = first_cell {
        write_dense_matrix(contributions.cell_matrix(), directory.join("data_l_m.dat"))?;
        write_dense_matrix(contributions.cell_precond(), directory.join("data_l_p.dat"))?;
    }

    let script_path = directory.join(script_name);
    let mut writer = create_file(&script_path)?;
    writer.write_all(matlab_script(n_blocks, first_cell.is_some()).as_bytes())?;
    writer
        .flush()
        .wrap_err_with(|| format!("failed to write script to {}", script_path.display()))?;

    info!("Wrote matrices in MATLAB format to {}", directory.display());
    Ok(())
}
