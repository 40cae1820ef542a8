/// eng
/// Conservation-law analysis of a reaction network. The module takes the
/// composition matrix of a network and produces the following data:
/// 1) the basis of linear invariants: row vectors v such that the linear
///    combination sum_i v_i*[species_i](t) is constant along any trajectory
/// 2) the rank of the composition matrix, equal to the number of independent
///    conserved quantities and to the number of species that may be
///    eliminated from the differential system without loss of information
/// 3) invariant values at a given initial state
/// All arithmetic is exact rational, so the rank cannot be corrupted by
/// floating point round-off.
/// ----------------------------------------------------------------
/// ru
/// Анализ законов сохранения реакционной сети. Модуль берет на вход матрицу
/// состава сети и выдает следующие данные:
/// 1) базис линейных инвариантов
/// 2) ранг матрицы состава, равный числу независимых сохраняющихся величин
/// 3) значения инвариантов в заданном начальном состоянии
/// Вся арифметика точная рациональная
pub mod invariant_analyzer;
/// Elimination of dependent species through linear invariants: a caller-chosen
/// subset of species is expressed in closed form through the remaining free
/// species and the invariant values at the initial condition, removing the
/// Jacobian singularity that the conservation laws otherwise cause.
pub mod reduced_system;
pub mod reduction_tests;
